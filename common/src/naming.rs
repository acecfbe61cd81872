//! アプリ名の正規化と表示名採用ポリシー

use lazy_static::lazy_static;
use regex::Regex;

/// 表示名の最大長（この文字数以上は採用しない）
pub const DEFAULT_MAX_NAME_LENGTH: usize = 50;

/// `.app` サフィックスを除去（大文字小文字を区別しない）
pub fn strip_app_suffix(name: &str) -> &str {
    let trimmed = name.trim();
    let len = trimmed.len();
    if len >= 4 && trimmed.is_char_boundary(len - 4) && trimmed[len - 4..].eq_ignore_ascii_case(".app") {
        &trimmed[..len - 4]
    } else {
        trimmed
    }
}

/// 表示名からアイコンファイル名を生成
///
/// `.app` を除去し、パス区切りとコロンを `-` に置換して `.png` を付ける。
/// 同じ表示名からは常に同じファイル名になる。
pub fn icon_file_name(display_text: &str) -> String {
    let stem: String = strip_app_suffix(display_text)
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    format!("{}.png", stem.trim())
}

/// 純粋な数字・バージョン文字列か（例: "12.0.3"）
pub fn is_version_like(name: &str) -> bool {
    lazy_static! {
        static ref VERSION_RE: Regex = Regex::new(r"^[0-9.]+$").unwrap();
    }
    VERSION_RE.is_match(name.trim())
}

/// 取得した表示名を記録に採用するかの判定
#[derive(Debug, Clone)]
pub struct AdoptionPolicy {
    /// この文字数以上の名前は採用しない
    pub max_length: usize,
    /// 数字だけの名前を拒否する
    pub reject_numeric: bool,
}

impl Default for AdoptionPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_NAME_LENGTH,
            reject_numeric: true,
        }
    }
}

impl AdoptionPolicy {
    pub fn should_adopt(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        if candidate.chars().count() >= self.max_length {
            return false;
        }
        !(self.reject_numeric && is_version_like(candidate))
    }

    /// 採用する場合のみ新しい名前を返す
    pub fn adopt<'a>(&self, current: &str, candidate: &'a str) -> Option<&'a str> {
        let candidate = strip_app_suffix(candidate);
        if candidate == current || !self.should_adopt(candidate) {
            return None;
        }
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_app_suffix() {
        assert_eq!(strip_app_suffix("Safari.app"), "Safari");
        assert_eq!(strip_app_suffix("Safari.APP"), "Safari");
        assert_eq!(strip_app_suffix("Safari"), "Safari");
        assert_eq!(strip_app_suffix(" Foo.app "), "Foo");
        assert_eq!(strip_app_suffix(".app"), "");
        assert_eq!(strip_app_suffix("アプリ"), "アプリ");
    }

    #[test]
    fn test_icon_file_name() {
        assert_eq!(icon_file_name("Foo"), "Foo.png");
        assert_eq!(icon_file_name("Foo.app"), "Foo.png");
        assert_eq!(icon_file_name("AC/DC: Live"), "AC-DC- Live.png");
        assert_eq!(icon_file_name("Visual Studio Code"), "Visual Studio Code.png");
    }

    #[test]
    fn test_is_version_like() {
        assert!(is_version_like("12.0.3"));
        assert!(is_version_like("2024"));
        assert!(!is_version_like("1Password"));
        assert!(!is_version_like(""));
    }

    #[test]
    fn test_adoption_boundary() {
        let policy = AdoptionPolicy::default();
        assert!(!policy.should_adopt(""));
        assert!(!policy.should_adopt("12.0.3"));
        assert!(policy.should_adopt("Visual Studio Code"));
    }

    #[test]
    fn test_adoption_length_limit() {
        let policy = AdoptionPolicy::default();
        assert!(policy.should_adopt(&"a".repeat(49)));
        assert!(!policy.should_adopt(&"a".repeat(50)));
    }

    #[test]
    fn test_adoption_is_configurable() {
        let policy = AdoptionPolicy {
            max_length: 5,
            reject_numeric: false,
        };
        assert!(policy.should_adopt("2024"));
        assert!(!policy.should_adopt("Safari"));
    }

    #[test]
    fn test_adopt_returns_only_changes() {
        let policy = AdoptionPolicy::default();
        assert_eq!(policy.adopt("VSCode", "Visual Studio Code"), Some("Visual Studio Code"));
        assert_eq!(policy.adopt("Foo", "Foo.app"), None);
        assert_eq!(policy.adopt("Foo", "1.2.3"), None);
    }
}
