use crate::batch::{BatchOptions, RetryPolicy, DEFAULT_CONCURRENCY, DEFAULT_ICON_SIZE};
use crate::cli::Cli;
use crate::error::{FetcherError, Result};
use crate::icon::MIN_ICON_BYTES;
use app_icon_common::{AdoptionPolicy, DEFAULT_MAX_NAME_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 設定ファイルの場所を上書きする環境変数
pub const CONFIG_ENV: &str = "APP_ICON_FETCHER_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub icon_size: u32,
    pub concurrency: usize,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub retry_factor: f64,
    pub min_icon_bytes: u64,
    pub max_name_length: usize,
    pub reject_numeric_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("toolSoftware/data.js"),
            output_dir: PathBuf::from("toolSoftware/icons"),
            icon_size: DEFAULT_ICON_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            retries: 2,
            retry_delay_ms: 500,
            retry_factor: 1.5,
            min_icon_bytes: MIN_ICON_BYTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            reject_numeric_names: true,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み（無ければデフォルト）
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        // 環境変数を優先
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| FetcherError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("app-icon-fetcher").join("config.json"))
    }

    /// コマンドライン引数で上書き
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(data) = &cli.data {
            self.data_path = data.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(size) = cli.size {
            self.icon_size = size;
        }
        if let Some(retries) = cli.retries {
            self.retries = retries;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(FetcherError::Config("concurrency は1以上にしてください".into()));
        }
        if self.icon_size == 0 {
            return Err(FetcherError::Config("icon_size は1以上にしてください".into()));
        }
        if self.max_name_length == 0 {
            return Err(FetcherError::Config("max_name_length は1以上にしてください".into()));
        }
        if !(self.retry_factor.is_finite() && self.retry_factor >= 1.0) {
            return Err(FetcherError::Config("retry_factor は1.0以上にしてください".into()));
        }
        Ok(())
    }

    pub fn batch_options(&self, only_missing: bool) -> BatchOptions {
        BatchOptions {
            output_dir: self.output_dir.clone(),
            icon_size: self.icon_size,
            concurrency: self.concurrency,
            only_missing,
            retry: RetryPolicy {
                retries: self.retries,
                initial_delay: Duration::from_millis(self.retry_delay_ms),
                factor: self.retry_factor,
            },
            adoption: AdoptionPolicy {
                max_length: self.max_name_length,
                reject_numeric: self.reject_numeric_names,
            },
            min_icon_bytes: self.min_icon_bytes,
        }
    }
}
