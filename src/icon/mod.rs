//! アイコンの探索と抽出
//!
//! - locator: バンドル内で最適なアイコン素材を探す
//! - extractor: 素材を固定サイズの PNG に変換して出力先へ置く

mod extractor;
mod locator;

pub use extractor::{ExtractIcon, SipsExtractor};
pub use locator::{IconLocator, LocateIcon};

use std::path::{Component, Path, PathBuf};

/// 有効なアイコンとみなす最小バイト数
pub const MIN_ICON_BYTES: u64 = 1000;

/// レコードのアイコン名を出力ディレクトリ内のパスにする
///
/// サイト上の絶対パス表記（`/Foo.png`）も出力ディレクトリ基準で扱う。
/// `..` などで出力ディレクトリの外を指す名前は `None`。
pub fn icon_path(output_dir: &Path, icon: &str) -> Option<PathBuf> {
    let mut path = output_dir.to_path_buf();
    let mut has_name = false;
    for component in Path::new(icon.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                has_name = true;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    has_name.then_some(path)
}

/// 新しいアイコン名を、既存の値と同じ表記（先頭 `/` の有無）にそろえる
pub fn icon_reference(previous: Option<&str>, file_name: &str) -> String {
    match previous {
        Some(previous) if previous.starts_with('/') => format!("/{}", file_name),
        _ => file_name.to_string(),
    }
}

/// ファイルが存在し、最小サイズを超えているか
pub fn is_valid_icon(path: &Path, min_bytes: u64) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > min_bytes)
        .unwrap_or(false)
}
