//! データファイルの読み込みと書き戻し
//!
//! 読み込みは1回だけ行い、ソーステキストとパース結果を不変のスナップショット
//! として保持する。書き戻し時はスナップショットと更新後レコードの差分を
//! 元テキストへ反映する。

use crate::error::Result;
use crate::parser::parse_data_source;
use crate::reconcile::{reconcile, Reconciliation};
use crate::types::Category;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    source: String,
    categories: Vec<Category>,
}

impl DataFile {
    /// ファイルを読み込んでパース
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_source(path, source)
    }

    /// 読み込み済みテキストからパース
    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let value = parse_data_source(&source)?;
        let categories: Vec<Category> = serde_json::from_value(value)?;

        Ok(Self {
            path: path.into(),
            source,
            categories,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 読み込み時点の分類一覧
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// 更新後レコードとの差分を元テキストへ反映（書き込みはしない）
    pub fn reconcile_with(&self, updated: &[Category]) -> Result<Reconciliation> {
        reconcile(&self.source, &self.categories, updated)
    }

    /// 差分があればファイルへ書き戻す
    pub fn write_reconciled(&self, updated: &[Category]) -> Result<Reconciliation> {
        let reconciliation = self.reconcile_with(updated)?;
        if reconciliation.changed_fields > 0 {
            std::fs::write(&self.path, &reconciliation.text)?;
        }
        Ok(reconciliation)
    }
}
