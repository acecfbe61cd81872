//! データファイルの型定義
//!
//! - Category: 分類（表示順を保持するアプリ一覧）
//! - ApplicationRecord: 分類内の1アプリ
//!
//! `text` と `icon` 以外のフィールドは解釈せず、そのまま保持する。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// アプリ1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// 表示名（検索キー・アイコンファイル名の元）
    #[serde(default)]
    pub text: String,

    /// 出力ディレクトリ内のアイコンファイル名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// type / desc / link / tags など（パイプラインでは不使用）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// 空文字を除いたアイコン名
    pub fn icon_name(&self) -> Option<&str> {
        self.icon.as_deref().filter(|name| !name.trim().is_empty())
    }
}

/// 分類
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub items: Vec<ApplicationRecord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(text: impl Into<String>, items: Vec<ApplicationRecord>) -> Self {
        Self {
            text: text.into(),
            items,
            extra: Map::new(),
        }
    }
}

/// 全分類のアプリ件数
pub fn count_records(categories: &[Category]) -> usize {
    categories.iter().map(|c| c.items.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_opaque_fields() {
        let value = json!({
            "text": "IINA",
            "type": "播放器",
            "link": "https://iina.io/",
            "tags": [{ "text": "免费", "type": "tip" }]
        });
        let record: ApplicationRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record.text, "IINA");
        assert!(record.icon.is_none());
        assert_eq!(record.extra.get("link"), Some(&json!("https://iina.io/")));
        assert_eq!(record.extra.len(), 3);
    }

    #[test]
    fn test_record_null_icon_is_absent() {
        let record: ApplicationRecord =
            serde_json::from_value(json!({ "text": "Foo", "icon": null })).unwrap();
        assert!(record.icon.is_none());
    }

    #[test]
    fn test_icon_name_ignores_empty() {
        let record = ApplicationRecord::new("Foo").with_icon("  ");
        assert_eq!(record.icon_name(), None);

        let record = ApplicationRecord::new("Foo").with_icon("Foo.png");
        assert_eq!(record.icon_name(), Some("Foo.png"));
    }

    #[test]
    fn test_category_without_items() {
        let category: Category = serde_json::from_value(json!({ "text": "空" })).unwrap();
        assert!(category.items.is_empty());
    }

    #[test]
    fn test_count_records() {
        let categories = vec![
            Category::new("A", vec![ApplicationRecord::new("a1"), ApplicationRecord::new("a2")]),
            Category::new("B", vec![ApplicationRecord::new("b1")]),
        ];
        assert_eq!(count_records(&categories), 3);
    }
}
