//! データファイルの読み込み・書き戻しテスト
//!
//! サイトで実際に使われている記法（TS の型注釈、ネストしたタグ、コメント）で検証

use app_icon_common::{count_records, DataFile, Error};
use tempfile::tempdir;

const TS_SOURCE: &str = r#"import Props from "./type";

// 分類ごとのアプリ一覧
const data: Props[] = [
  {
    text: "影音阅读",
    items: [
      {
        text: "IINA",
        type: "播放器",
        desc: "适用于 macOS 的 现代 媒体播放器。",
        link: "https://iina.io/",
        github: "https://github.com/iina/iina",
        tags: [{ text: "免费", type: "tip" }],
      },
      {
        text: "Chrome",
        type: "浏览器",
        icon: "/chrome.png",
        link: "https://www.google.cn/intl/zh-CN/chrome/",
        tags: [{ text: "免费", type: "tip" }],
      },
    ],
  },
  {
    text: "小工具",
    items: [
      /* 未インストール */
      {
        text: 'Itsycal',
        desc: `Itsycal 是一个微型菜单栏日历。`,
      },
    ],
  },
];

export default data;
"#;

#[test]
fn test_load_typescript_module() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.ts");
    std::fs::write(&path, TS_SOURCE).unwrap();

    let data = DataFile::load(&path).unwrap();
    let categories = data.categories();

    assert_eq!(categories.len(), 2);
    assert_eq!(count_records(categories), 3);
    assert_eq!(categories[0].items[1].icon.as_deref(), Some("/chrome.png"));
    assert_eq!(categories[1].items[0].text, "Itsycal");
    assert!(categories[0].items[0].extra.contains_key("tags"));
}

#[test]
fn test_write_back_preserves_everything_else() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.ts");
    std::fs::write(&path, TS_SOURCE).unwrap();
    let data = DataFile::load(&path).unwrap();

    let mut updated = data.categories().to_vec();
    updated[0].items[0].icon = Some("IINA.png".into());
    updated[0].items[1].icon = Some("Chrome.png".into());
    updated[1].items[0].icon = Some("Itsycal.png".into());

    let changed = data.write_reconciled(&updated).unwrap().changed_fields;
    assert_eq!(changed, 3);

    let written = std::fs::read_to_string(&path).unwrap();
    let expected = TS_SOURCE
        .replace(
            "        text: \"IINA\",\n",
            "        text: \"IINA\",\n        icon: \"IINA.png\",\n",
        )
        .replace("icon: \"/chrome.png\"", "icon: \"Chrome.png\"")
        .replace(
            "        text: 'Itsycal',\n",
            "        text: 'Itsycal',\n        icon: 'Itsycal.png',\n",
        );
    assert_eq!(written, expected);

    // 書き戻したファイルも読み込める
    let reloaded = DataFile::load(&path).unwrap();
    assert_eq!(reloaded.categories(), updated.as_slice());
}

#[test]
fn test_syntax_error_reports_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.js");
    std::fs::write(&path, "export default [\n  {\n    text \"Foo\"\n  },\n];\n").unwrap();

    let err = DataFile::load(&path).unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert!(err.to_string().contains("3行目"), "{}", err);
}

#[test]
fn test_module_without_array_export() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.js");
    std::fs::write(&path, "export const personalInfo = { name: \"x\" };\n").unwrap();

    assert!(matches!(DataFile::load(&path), Err(Error::Parse(_))));
}
