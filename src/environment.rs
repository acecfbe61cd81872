//! 実行環境のチェック
//!
//! どれか1つでも満たさなければ、アプリの処理を始める前に終了する。

use crate::config::Config;
use crate::error::{FetcherError, Result};
use crate::executor::{shell_quote, CommandExecutor};
use std::path::Path;
use tracing::debug;

/// 必要な外部コマンド
pub const REQUIRED_TOOLS: &[&str] = &["mdfind", "mdls", "sips", "defaults", "osascript"];

pub fn check_platform(os: &str) -> Result<()> {
    if os == "macos" {
        Ok(())
    } else {
        Err(FetcherError::Environment(format!(
            "このツールは macOS 専用です（現在: {}）",
            os
        )))
    }
}

pub async fn check_tools<E: CommandExecutor>(executor: &E, tools: &[&str]) -> Result<()> {
    let mut missing = Vec::new();
    for tool in tools {
        let found = executor
            .run(&format!("command -v {}", shell_quote(tool)), None)
            .await?;
        if found.is_empty() {
            missing.push(*tool);
        } else {
            debug!(tool, path = %found, "コマンド確認");
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FetcherError::Environment(format!(
            "必要なコマンドが見つかりません: {}",
            missing.join(", ")
        )))
    }
}

pub fn check_data_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(FetcherError::Environment(format!(
            "データファイルが見つかりません: {}",
            path.display()
        )))
    }
}

/// 出力ディレクトリを作成（既存なら何もしない）
pub fn prepare_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        FetcherError::Environment(format!(
            "出力ディレクトリを作成できません: {} ({})",
            path.display(),
            e
        ))
    })
}

/// すべてのチェックを実行
pub async fn check_environment<E: CommandExecutor>(executor: &E, config: &Config) -> Result<()> {
    check_platform(std::env::consts::OS)?;
    check_tools(executor, REQUIRED_TOOLS).await?;
    check_data_file(&config.data_path)?;
    prepare_output_dir(&config.output_dir)
}
