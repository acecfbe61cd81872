//! データファイルパーサー
//!
//! サイトのデータファイル（JS/TSモジュール）からエクスポートされた配列リテラルを
//! 探し、`serde_json::Value` に変換する。
//!
//! 対応する記法:
//! - `export default [ ... ]`
//! - `const data: Props[] = [ ... ]; export default data;`
//! - `export const data = [ ... ]`
//!
//! リテラル内では引用符なしのキー、シングル/ダブル/バッククォート文字列
//! （`${}` 展開なし）、末尾カンマ、コメント、数値、true/false/null/undefined を扱う。

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Number, Value};

/// エクスポートされた配列リテラルの開始位置を探す
///
/// 抽出優先順位:
/// 1. `export default [`
/// 2. `export default 識別子` → その識別子の宣言 `= [`
/// 3. `export const data = [`
pub fn find_exported_array(source: &str) -> Result<usize> {
    lazy_static! {
        static ref EXPORT_DEFAULT: Regex = Regex::new(r"export\s+default\s+").unwrap();
        static ref EXPORT_DATA: Regex =
            Regex::new(r"export\s+(?:const|let|var)\s+data\b[^=;]*=\s*").unwrap();
    }

    if let Some(m) = EXPORT_DEFAULT.find(source) {
        let rest = &source[m.end()..];
        if rest.starts_with('[') {
            return Ok(m.end());
        }

        let ident: String = rest.chars().take_while(|&c| is_ident_char(c)).collect();
        if !ident.is_empty() {
            let declaration = Regex::new(&format!(
                r"(?:const|let|var)\s+{}\b[^=;]*=\s*",
                regex::escape(&ident)
            ))?;
            if let Some(d) = declaration.find(source) {
                return Ok(d.end());
            }
        }
    }

    if let Some(m) = EXPORT_DATA.find(source) {
        return Ok(m.end());
    }

    Err(Error::Parse("エクスポートされた配列が見つかりません".into()))
}

/// `start` 位置からリテラルを1つ読み取る
pub fn parse_literal(source: &str, start: usize) -> Result<Value> {
    let mut parser = LiteralParser { src: source, pos: start };
    parser.parse_value()
}

/// データファイル全体から配列リテラルを読み取る
pub fn parse_data_source(source: &str) -> Result<Value> {
    let start = find_exported_array(source)?;
    let value = parse_literal(source, start)?;
    if !value.is_array() {
        return Err(Error::Parse("エクスポートされた値が配列ではありません".into()));
    }
    Ok(value)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        let line = self.src[..self.pos].matches('\n').count() + 1;
        Error::Parse(format!("{}行目: {}", line, message.into()))
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("'{}' が必要ですが '{}' がありました", expected, c))),
            None => Err(self.error(format!("'{}' が必要ですがファイルが終わっています", expected))),
        }
    }

    /// 空白とコメントを読み飛ばす
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            let rest = self.rest();
            match rest.chars().next() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if rest.starts_with("//") => match rest.find('\n') {
                    Some(i) => self.pos += i,
                    None => self.pos = self.src.len(),
                },
                Some('/') if rest.starts_with("/*") => match rest[2..].find("*/") {
                    Some(i) => self.pos += i + 4,
                    None => return Err(self.error("コメントが閉じられていません")),
                },
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some(q @ ('"' | '\'' | '`')) => self.parse_string(q).map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_ident_start(c) => {
                let ident = self.parse_ident();
                match ident.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" | "undefined" => Ok(Value::Null),
                    other => Err(self.error(format!("未対応の識別子です: {}", other))),
                }
            }
            Some(c) => Err(self.error(format!("予期しない文字です: '{}'", c))),
            None => Err(self.error("ファイルが途中で終わっています")),
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();

        loop {
            self.skip_trivia()?;
            let key = match self.peek() {
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(q @ ('"' | '\'')) => self.parse_string(q)?,
                Some(c) if is_ident_char(c) => self.parse_ident(),
                Some(c) => return Err(self.error(format!("キーが必要ですが '{}' がありました", c))),
                None => return Err(self.error("オブジェクトが閉じられていません")),
            };

            self.skip_trivia()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => return Err(self.error(format!("',' または '}}' が必要ですが '{}' がありました", c))),
                None => return Err(self.error("オブジェクトが閉じられていません")),
            }
        }

        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                break;
            }

            items.push(self.parse_value()?);

            self.skip_trivia()?;
            match self.bump() {
                Some(',') => continue,
                Some(']') => break,
                Some(c) => return Err(self.error(format!("',' または ']' が必要ですが '{}' がありました", c))),
                None => return Err(self.error("配列が閉じられていません")),
            }
        }

        Ok(Value::Array(items))
    }

    fn parse_ident(&mut self) -> String {
        let ident: String = self.rest().chars().take_while(|&c| is_ident_char(c)).collect();
        self.pos += ident.len();
        ident
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        self.bump();
        let mut out = String::new();

        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("文字列が閉じられていません")),
            };

            match c {
                c if c == quote => return Ok(out),
                '\\' => self.parse_escape(&mut out)?,
                '\n' if quote != '`' => return Err(self.error("文字列の途中で改行しています")),
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error("テンプレート文字列の ${} 展開は未対応です"));
                }
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let c = match self.bump() {
            Some(c) => c,
            None => return Err(self.error("エスケープが途中で終わっています")),
        };

        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // 行継続
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            'x' => {
                let hex = self.take_hex(2)?;
                out.push(self.char_from_hex(&hex)?);
            }
            'u' => {
                let hex = if self.peek() == Some('{') {
                    self.bump();
                    let hex: String = self.rest().chars().take_while(|c| *c != '}').collect();
                    self.pos += hex.len();
                    self.expect('}')?;
                    hex
                } else {
                    self.take_hex(4)?
                };
                out.push(self.char_from_hex(&hex)?);
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn take_hex(&mut self, len: usize) -> Result<String> {
        let hex: String = self.rest().chars().take(len).collect();
        if hex.chars().count() != len || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error("不正なエスケープシーケンスです"));
        }
        self.pos += hex.len();
        Ok(hex)
    }

    fn char_from_hex(&self, hex: &str) -> Result<char> {
        u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("不正な文字コードです"))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            text.push(sign);
            self.bump();
        }

        while let Some(c) = self.peek() {
            let exponent_sign = (c == '-' || c == '+')
                && text.ends_with(['e', 'E'])
                && !text.to_ascii_lowercase().contains("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let cleaned = text.replace('_', "");
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(d) => (true, d),
            None => (false, cleaned.trim_start_matches('+')),
        };

        if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            let n = i64::from_str_radix(hex, 16)
                .map_err(|_| self.error(format!("不正な数値です: {}", text)))?;
            return Ok(Value::Number(Number::from(if negative { -n } else { n })));
        }

        if let Ok(n) = cleaned.trim_start_matches('+').parse::<i64>() {
            return Ok(Value::Number(Number::from(n)));
        }

        cleaned
            .trim_start_matches('+')
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("不正な数値です: {}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =============================================
    // find_exported_array テスト
    // =============================================

    #[test]
    fn test_find_export_default_array() {
        let source = "// header\nexport default [\n  { text: 'a' },\n];\n";
        let start = find_exported_array(source).unwrap();
        assert!(source[start..].starts_with('['));
    }

    #[test]
    fn test_find_export_default_identifier() {
        let source = r#"import Props from "./type";

const data: Props[] = [
  { text: "影音阅读", items: [] },
];

export default data;
"#;
        let start = find_exported_array(source).unwrap();
        assert!(source[start..].starts_with('['));
    }

    #[test]
    fn test_find_export_const_data() {
        let source = "export const data = [];";
        let start = find_exported_array(source).unwrap();
        assert_eq!(&source[start..], "[];");
    }

    #[test]
    fn test_find_without_export() {
        let result = find_exported_array("const x = [1, 2];");
        assert!(result.is_err());
        if let Err(Error::Parse(msg)) = result {
            assert!(msg.contains("配列が見つかりません"));
        } else {
            panic!("Expected Parse error");
        }
    }

    // =============================================
    // parse_data_source テスト
    // =============================================

    #[test]
    fn test_parse_js_data_file() {
        let source = r#"export default [
  {
    text: "影音阅读",
    items: [
      {
        text: "IINA",
        icon: "IINA.png",
        type: "播放器",
        link: "https://iina.io/",
        tags: [
          {
            text: "免费",
            type: "tip",
          },
        ],
      },
      /* アイコン未取得 */
      {
        text: 'Infuse',
        desc: "It's \"great\"", // 行末コメント
      },
    ],
  },
];
"#;
        let value = parse_data_source(source).unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "text": "影音阅读",
                    "items": [
                        {
                            "text": "IINA",
                            "icon": "IINA.png",
                            "type": "播放器",
                            "link": "https://iina.io/",
                            "tags": [{ "text": "免费", "type": "tip" }]
                        },
                        { "text": "Infuse", "desc": "It's \"great\"" }
                    ]
                }
            ])
        );
    }

    #[test]
    fn test_parse_scalars() {
        let source = r#"export default [1, -2.5, 1e3, 0x1F, true, false, null, undefined, "a\tb", 'café', `tpl`]"#;
        let value = parse_data_source(source).unwrap();
        assert_eq!(
            value,
            json!([1, -2.5, 1000.0, 31, true, false, null, null, "a\tb", "café", "tpl"])
        );
    }

    #[test]
    fn test_parse_quoted_keys() {
        let source = r#"export default [{ "text": "A", 'icon': "A.png" }]"#;
        let value = parse_data_source(source).unwrap();
        assert_eq!(value, json!([{ "text": "A", "icon": "A.png" }]));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let source = "export default [\n  { text: \"A\" },\n  { text \"B\" },\n];";
        let result = parse_data_source(source);
        match result {
            Err(Error::Parse(msg)) => assert!(msg.starts_with("3行目"), "{}", msg),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unterminated_string() {
        let result = parse_data_source("export default [\"abc");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_template_interpolation_rejected() {
        let result = parse_data_source("export default [`${name}`]");
        match result {
            Err(Error::Parse(msg)) => assert!(msg.contains("未対応")),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_identifier_rejected() {
        let result = parse_data_source("export default [{ text: someVar }]");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_non_array_export() {
        let result = parse_data_source("export default { text: 'a' }");
        assert!(result.is_err());
    }
}
