//! 実行中のみ有効なルックアップキャッシュ
//!
//! アプリ名 → バンドルパス、バンドルパス → 表示名 の2つのマップ。
//! 追加のみで更新・削除はしないので、同じキーへの同時挿入は同じ値の上書きになる。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct LookupCache {
    app_paths: Mutex<HashMap<String, PathBuf>>,
    display_names: Mutex<HashMap<PathBuf, String>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_path(&self, name: &str) -> Option<PathBuf> {
        self.app_paths
            .lock()
            .ok()
            .and_then(|map| map.get(name).cloned())
    }

    pub fn insert_app_path(&self, name: &str, path: &Path) {
        if let Ok(mut map) = self.app_paths.lock() {
            map.insert(name.to_string(), path.to_path_buf());
        }
    }

    pub fn display_name(&self, path: &Path) -> Option<String> {
        self.display_names
            .lock()
            .ok()
            .and_then(|map| map.get(path).cloned())
    }

    pub fn insert_display_name(&self, path: &Path, name: &str) {
        if let Ok(mut map) = self.display_names.lock() {
            map.insert(path.to_path_buf(), name.to_string());
        }
    }

    /// (パス件数, 表示名件数)
    pub fn len(&self) -> (usize, usize) {
        let paths = self.app_paths.lock().map(|m| m.len()).unwrap_or(0);
        let names = self.display_names.lock().map(|m| m.len()).unwrap_or(0);
        (paths, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_starts_empty() {
        let cache = LookupCache::new();
        assert_eq!(cache.len(), (0, 0));
        assert!(cache.app_path("Foo").is_none());
    }

    #[test]
    fn test_maps_are_independent() {
        let cache = LookupCache::new();
        let path = Path::new("/Applications/Foo.app");

        cache.insert_app_path("Foo", path);
        assert_eq!(cache.app_path("Foo"), Some(path.to_path_buf()));
        assert!(cache.display_name(path).is_none());

        cache.insert_display_name(path, "Foo Pro");
        assert_eq!(cache.display_name(path), Some("Foo Pro".to_string()));
        assert_eq!(cache.len(), (1, 1));
    }

    #[test]
    fn test_repeated_insert_is_idempotent() {
        let cache = LookupCache::new();
        let path = Path::new("/Applications/Foo.app");

        cache.insert_app_path("Foo", path);
        cache.insert_app_path("Foo", path);

        assert_eq!(cache.len(), (1, 0));
    }
}
