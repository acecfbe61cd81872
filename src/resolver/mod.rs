//! アプリ名からバンドルパスと表示名を解決する
//!
//! - パス: Spotlight (`mdfind`) の完全一致 → 部分一致
//! - 表示名: Finder の表示名 → Spotlight の表示名 → Info.plist → ファイル名
//!
//! どちらも `LookupCache` にキャッシュする。

mod cache;

pub use cache::LookupCache;

use crate::error::{FetcherError, Result};
use crate::executor::{shell_quote, CommandExecutor};
use app_icon_common::strip_app_suffix;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// 解決結果（保存しない）
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedApplication {
    pub display_text: String,
    pub path: PathBuf,
    pub true_name: String,
}

#[allow(async_fn_in_trait)]
pub trait ResolveApplication {
    async fn resolve_path(&self, name: &str) -> Result<PathBuf>;

    async fn resolve_true_name(&self, path: &Path) -> Result<String>;

    async fn resolve_application(&self, name: &str) -> Result<ResolvedApplication> {
        let path = self.resolve_path(name).await?;
        let true_name = self.resolve_true_name(&path).await?;
        Ok(ResolvedApplication {
            display_text: name.to_string(),
            path,
            true_name,
        })
    }
}

/// 外部コマンドで解決するリゾルバ
pub struct AppResolver<E> {
    executor: E,
    cache: Arc<LookupCache>,
}

impl<E: CommandExecutor> AppResolver<E> {
    pub fn new(executor: E, cache: Arc<LookupCache>) -> Self {
        Self { executor, cache }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    async fn spotlight_lookup(&self, display_name_clause: String) -> Result<Option<PathBuf>> {
        let query = format!(
            "kMDItemContentType == \"com.apple.application-bundle\" && kMDItemDisplayName == {}",
            display_name_clause
        );
        let output = self
            .executor
            .run(&format!("mdfind {} | head -1", shell_quote(&query)), None)
            .await?;

        Ok(output
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from))
    }

    async fn finder_display_name(&self, path: &Path) -> Result<String> {
        let script = format!(
            "tell application \"Finder\" to get displayed name of (POSIX file \"{}\" as alias)",
            escape_applescript(&path.to_string_lossy())
        );
        self.executor
            .run(&format!("osascript -e {}", shell_quote(&script)), None)
            .await
    }

    async fn spotlight_display_name(&self, path: &Path) -> Result<String> {
        let output = self
            .executor
            .run(
                &format!(
                    "mdls -raw -name kMDItemDisplayName {}",
                    shell_quote(&path.to_string_lossy())
                ),
                None,
            )
            .await?;
        // 属性がない場合 mdls は "(null)" を出力する
        Ok(if output == "(null)" { String::new() } else { output })
    }

    async fn bundle_info_value(&self, path: &Path, key: &str) -> Result<String> {
        let info = path.join("Contents").join("Info");
        self.executor
            .run(
                &format!("defaults read {} {}", shell_quote(&info.to_string_lossy()), key),
                None,
            )
            .await
    }
}

impl<E: CommandExecutor> ResolveApplication for AppResolver<E> {
    async fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        if let Some(path) = self.cache.app_path(name) {
            debug!(name, path = %path.display(), "パス: キャッシュ");
            return Ok(path);
        }

        let escaped = escape_mdfind(name);
        let found = match self.spotlight_lookup(format!("\"{}\"", escaped)).await? {
            Some(path) => Some(path),
            None => self.spotlight_lookup(format!("\"*{}*\"cd", escaped)).await?,
        };

        let path = found.ok_or_else(|| FetcherError::NotFound(name.to_string()))?;
        debug!(name, path = %path.display(), "パス解決");
        self.cache.insert_app_path(name, &path);
        Ok(path)
    }

    async fn resolve_true_name(&self, path: &Path) -> Result<String> {
        if let Some(name) = self.cache.display_name(path) {
            return Ok(name);
        }

        // 取得元を順に試し、最初に空でなかったものを採用
        let mut name = usable_name(&self.finder_display_name(path).await?);
        if name.is_none() {
            name = usable_name(&self.spotlight_display_name(path).await?);
        }
        for key in ["CFBundleDisplayName", "CFBundleName"] {
            if name.is_some() {
                break;
            }
            name = usable_name(&self.bundle_info_value(path, key).await?);
        }

        let name = name
            .or_else(|| path.file_name().and_then(|f| usable_name(&f.to_string_lossy())))
            .ok_or_else(|| FetcherError::NameRetrieval(path.display().to_string()))?;
        self.cache.insert_display_name(path, &name);
        Ok(name)
    }
}

/// `.app` を除いて空でなければ採用
fn usable_name(candidate: &str) -> Option<String> {
    Some(strip_app_suffix(candidate))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// mdfind クエリの文字列リテラル用エスケープ
fn escape_mdfind(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_applescript(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
