//! バッチ処理
//!
//! 全分類のアプリを列挙し、上限付きの並行数で
//! パス解決 → 表示名の採用 → アイコン抽出 を行う。
//! 全件が終わってから1回だけデータファイルへ書き戻す。

mod progress;
mod retry;

pub use progress::{Milestone, Progress};
pub use retry::{with_retry, RetryPolicy};

use crate::error::{FailureKind, Result};
use crate::icon::{icon_path, icon_reference, is_valid_icon, ExtractIcon, LocateIcon, MIN_ICON_BYTES};
use crate::resolver::ResolveApplication;
use app_icon_common::{icon_file_name, AdoptionPolicy, ApplicationRecord, Category, DataFile};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// デフォルトのアイコンサイズ（px）
pub const DEFAULT_ICON_SIZE: u32 = 64;
/// デフォルトの並行数
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    pub icon_size: u32,
    pub concurrency: usize,
    /// 有効なアイコンを持つアプリを列挙時点で除外する
    pub only_missing: bool,
    pub retry: RetryPolicy,
    pub adoption: AdoptionPolicy,
    pub min_icon_bytes: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("toolSoftware/icons"),
            icon_size: DEFAULT_ICON_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            only_missing: false,
            retry: RetryPolicy::default(),
            adoption: AdoptionPolicy::default(),
            min_icon_bytes: MIN_ICON_BYTES,
        }
    }
}

/// 失敗したアプリ
#[derive(Debug, Clone)]
pub struct FailedApp {
    pub record: ApplicationRecord,
    pub kind: FailureKind,
    pub message: String,
}

/// バッチ結果（各アプリはどれか1つに入る）
#[derive(Debug, Default)]
pub struct BatchResult {
    /// アイコンまたは名前が変わった（更新後のレコード）
    pub updated: Vec<ApplicationRecord>,
    /// 処理は成功したが変更なし
    pub unchanged: Vec<ApplicationRecord>,
    /// 有効なアイコンがあり対象外
    pub skipped: Vec<ApplicationRecord>,
    pub failed: Vec<FailedApp>,
    /// 同時に処理中だった最大件数
    pub peak_in_flight: usize,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.updated.len() + self.unchanged.len() + self.skipped.len() + self.failed.len()
    }
}

/// バッチ実行と書き戻しの結果
#[derive(Debug)]
pub struct RunReport {
    pub result: BatchResult,
    /// データファイルで変更したフィールド数
    pub changed_fields: usize,
    /// 更新したがデータファイル上で値が見つからず反映できなかったアプリ
    pub unapplied: Vec<String>,
}

pub struct BatchProcessor<R, L, X> {
    resolver: R,
    locator: L,
    extractor: X,
    options: BatchOptions,
}

impl<R, L, X> BatchProcessor<R, L, X>
where
    R: ResolveApplication,
    L: LocateIcon,
    X: ExtractIcon,
{
    pub fn new(resolver: R, locator: L, extractor: X, options: BatchOptions) -> Self {
        Self {
            resolver,
            locator,
            extractor,
            options,
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }

    /// 記録されたアイコンが出力先に存在し、最小サイズを超えているか
    pub fn has_valid_icon(&self, record: &ApplicationRecord) -> bool {
        record
            .icon_name()
            .and_then(|name| icon_path(&self.options.output_dir, name))
            .map(|path| is_valid_icon(&path, self.options.min_icon_bytes))
            .unwrap_or(false)
    }

    /// 全アプリを処理し、成功したレコードを `categories` に反映する
    pub async fn run(&self, categories: &mut [Category]) -> BatchResult {
        let mut result = BatchResult::default();
        let mut pending = Vec::new();

        for (category_index, category) in categories.iter().enumerate() {
            for (item_index, record) in category.items.iter().enumerate() {
                if record.text.trim().is_empty() {
                    continue;
                }
                let has_icon = self.has_valid_icon(record);
                if self.options.only_missing && has_icon {
                    result.skipped.push(record.clone());
                    continue;
                }
                pending.push(((category_index, item_index), record.clone(), has_icon));
            }
        }

        info!("{}件のアプリを処理します（スキップ {}件）", pending.len(), result.skipped.len());

        let mut progress = Progress::new(pending.len());
        let in_flight = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);

        let mut outcomes = stream::iter(pending)
            .map(|(position, record, has_icon)| async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                let outcome = with_retry(&self.options.retry, || self.process_app(&record, has_icon)).await;

                in_flight.fetch_sub(1, Ordering::SeqCst);
                (position, record, outcome)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some(((category_index, item_index), original, outcome)) = outcomes.next().await {
            match outcome {
                Ok(updated) if updated != original => {
                    categories[category_index].items[item_index] = updated.clone();
                    result.updated.push(updated);
                }
                Ok(_) => result.unchanged.push(original),
                Err(e) => {
                    debug!(app = %original.text, error = %e, "処理失敗");
                    result.failed.push(FailedApp {
                        kind: e.kind(),
                        message: e.to_string(),
                        record: original,
                    });
                }
            }

            if let Some(milestone) = progress.advance() {
                info!("{}", milestone);
            }
        }

        result.peak_in_flight = peak.load(Ordering::SeqCst);
        debug!(processed = progress.processed(), total = result.total(), "バッチ完了");
        result
    }

    /// スナップショットを複製して処理し、更新があればデータファイルへ書き戻す
    pub async fn run_and_save(&self, data: &DataFile) -> Result<RunReport> {
        let mut categories = data.categories().to_vec();
        let result = self.run(&mut categories).await;

        let (changed_fields, unapplied) = if result.updated.is_empty() {
            (0, Vec::new())
        } else {
            let reconciliation = data.write_reconciled(&categories)?;
            (reconciliation.changed_fields, reconciliation.unapplied)
        };
        for name in &unapplied {
            warn!(app = %name, "データファイル上に対応する値が見つからず反映できません");
        }
        if changed_fields > 0 {
            info!("データファイルを保存: {}フィールド更新", changed_fields);
        } else {
            info!("データファイルに変更はありません");
        }

        Ok(RunReport {
            result,
            changed_fields,
            unapplied,
        })
    }

    /// 1アプリ分の処理。更新後のレコードを返す（元のレコードは変更しない）
    async fn process_app(&self, record: &ApplicationRecord, has_icon: bool) -> Result<ApplicationRecord> {
        let resolved = self.resolver.resolve_application(&record.text).await?;
        let mut updated = record.clone();

        if let Some(name) = self.options.adoption.adopt(&record.text, &resolved.true_name) {
            info!("表示名を更新: \"{}\" -> \"{}\"", record.text, name);
            updated.text = name.to_string();
        }

        if has_icon {
            return Ok(updated);
        }

        let file_name = icon_file_name(&updated.text);
        let output = self.options.output_dir.join(&file_name);
        let resource = self
            .locator
            .locate_icon_resource(&resolved.path, &updated.text)
            .await;
        self.extractor
            .extract_icon(&resource, &resolved.path, &output, self.options.icon_size)
            .await?;

        debug!(app = %updated.text, icon = %file_name, "アイコン取得");
        updated.icon = Some(icon_reference(record.icon_name(), &file_name));
        Ok(updated)
    }
}
