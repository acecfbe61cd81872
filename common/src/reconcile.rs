//! データファイルの差分書き戻し
//!
//! 更新後のレコードを元のソーステキストへ最小限のテキスト置換で反映する。
//! 全体を再シリアライズしないので、コメント・書式・無関係なフィールドは
//! そのまま残る。
//!
//! ## 既知の制約
//! 同じ値の `text:` / `icon:` 代入が複数箇所にある場合（同名アプリが2件など）、
//! 一致した箇所はすべて置換される。
//! ソース上の値が見つからなかったレコードは `unapplied` に残る。

use crate::error::Result;
use crate::types::{ApplicationRecord, Category};
use regex::{Captures, Regex};

/// 書き戻し結果
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// 置換後のテキスト
    pub text: String,
    /// 実際に変更したフィールド数
    pub changed_fields: usize,
    /// 変更があるのにソース上で1箇所も置換できなかったレコードの表示名
    pub unapplied: Vec<String>,
}

/// 元レコードと更新後レコードを位置で対応付けて差分を反映する
///
/// 片方にしかない分類・アプリは無視する。
pub fn reconcile(
    source: &str,
    original: &[Category],
    updated: &[Category],
) -> Result<Reconciliation> {
    let mut text = source.to_string();
    let mut changed_fields = 0;
    let mut unapplied = Vec::new();

    for (original_category, updated_category) in original.iter().zip(updated) {
        for (original_app, updated_app) in original_category.items.iter().zip(&updated_category.items) {
            let changed = patch_record(&mut text, original_app, updated_app)?;
            if changed == 0 && has_changes(original_app, updated_app) {
                unapplied.push(updated_app.text.clone());
            }
            changed_fields += changed;
        }
    }

    Ok(Reconciliation {
        text,
        changed_fields,
        unapplied,
    })
}

/// 書き戻し対象のフィールドに差分があるか
fn has_changes(original: &ApplicationRecord, updated: &ApplicationRecord) -> bool {
    original.text != updated.text
        || updated
            .icon_name()
            .map(|icon| original.icon.as_deref() != Some(icon))
            .unwrap_or(false)
}

/// 1レコード分の差分を反映し、変更したフィールド数を返す
pub fn patch_record(
    text: &mut String,
    original: &ApplicationRecord,
    updated: &ApplicationRecord,
) -> Result<usize> {
    let mut changed = 0;

    if original.text != updated.text && replace_field(text, "text", &original.text, &updated.text)? {
        changed += 1;
    }

    if let Some(new_icon) = updated.icon_name() {
        if original.icon.as_deref() != Some(new_icon) {
            let applied = match original.icon.as_deref() {
                Some(old_icon) => replace_field(text, "icon", old_icon, new_icon)?,
                None => insert_icon_after_text(text, &updated.text, new_icon)?,
            };
            if applied {
                changed += 1;
            }
        }
    }

    Ok(changed)
}

/// `field: "value"` に一致する正規表現（キーの引用符・空白の揺れを許容）
fn field_pattern(field: &str, value: &str) -> Result<Regex> {
    let pattern = format!(
        r#"(\b{}["']?\s*:\s*)(["'`]){}["'`]"#,
        regex::escape(field),
        literal_pattern(value)
    );
    Ok(Regex::new(&pattern)?)
}

/// パース済みの値に、ソース上のエスケープ表記も含めて一致するパターン
///
/// 各文字はそのままの形のほか `\'` `\xHH` `\uHHHH` `\u{H}` でも一致する。
fn literal_pattern(value: &str) -> String {
    value.chars().map(char_pattern).collect()
}

fn char_pattern(c: char) -> String {
    let code = c as u32;
    let mut alternatives = Vec::new();

    if c != '\\' {
        alternatives.push(regex::escape(c.encode_utf8(&mut [0; 4])));
    }
    match short_escape(c) {
        Some(letter) => alternatives.push(format!(r"\\{}", regex::escape(letter))),
        // `\n` などは別の文字になるので、それ以外の文字だけ `\c` を許容
        None if !"ntrbfv0xu\r\n".contains(c) => {
            alternatives.push(format!(r"\\{}", regex::escape(c.encode_utf8(&mut [0; 4]))));
        }
        None => {}
    }
    if code <= 0xff {
        alternatives.push(format!(r"\\x(?i:{:02x})", code));
    }
    if code <= 0xffff {
        alternatives.push(format!(r"\\u(?i:{:04x})", code));
    }
    alternatives.push(format!(r"\\u\{{0*(?i:{:x})\}}", code));

    format!("(?:{})", alternatives.join("|"))
}

fn short_escape(c: char) -> Option<&'static str> {
    match c {
        '\n' => Some("n"),
        '\t' => Some("t"),
        '\r' => Some("r"),
        '\u{8}' => Some("b"),
        '\u{c}' => Some("f"),
        '\u{b}' => Some("v"),
        '\0' => Some("0"),
        '\\' => Some("\\"),
        _ => None,
    }
}

/// 引用符に合わせて値をエスケープ
fn quote_value(value: &str, quote: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace(quote, &format!("\\{}", quote));
    format!("{}{}{}", quote, escaped, quote)
}

fn apply(text: &mut String, replaced: String) -> bool {
    if replaced == *text {
        return false;
    }
    *text = replaced;
    true
}

fn replace_field(text: &mut String, field: &str, old: &str, new: &str) -> Result<bool> {
    let re = field_pattern(field, old)?;
    let replaced = re
        .replace_all(text.as_str(), |caps: &Captures| {
            format!("{}{}", &caps[1], quote_value(new, &caps[2]))
        })
        .into_owned();
    Ok(apply(text, replaced))
}

/// text 代入の直後に icon 代入を挿入する
///
/// text 代入が行頭（インデントのみ）にあれば同じインデントで次の行に、
/// 1行に複数フィールドが並んでいれば同じ行に挿入する。
fn insert_icon_after_text(text: &mut String, record_text: &str, icon: &str) -> Result<bool> {
    let re = field_pattern("text", record_text)?;
    let source = text.clone();
    let replaced = re.replace_all(&source, |caps: &Captures| {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prefix = &source[line_start..start];
        let icon_literal = quote_value(icon, &caps[2]);

        if prefix.trim().is_empty() {
            format!("{},\n{}icon: {}", &caps[0], prefix, icon_literal)
        } else {
            format!("{}, icon: {}", &caps[0], icon_literal)
        }
    });
    Ok(apply(text, replaced.into_owned()))
}
