//! 外部コマンド実行
//!
//! コマンド文字列を `sh -c` で実行し、トリムした標準出力を返す。
//! 失敗時はコンテキスト付きなら `Execution` エラー、なしなら空文字列を返す
//! （存在しないことが想定内の問い合わせ用）。

use crate::error::{FetcherError, Result};
use tokio::process::Command;
use tracing::debug;

/// 外部コマンドの実行器
///
/// テストではカウンタ付き・スクリプト化したダブルに差し替える。
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    async fn run(&self, command: &str, context: Option<&str>) -> Result<String>;
}

/// `sh -c` で実行する標準の実行器
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    async fn run(&self, command: &str, context: Option<&str>) -> Result<String> {
        debug!(command, "コマンド実行");

        let failure = match Command::new("sh").arg("-c").arg(command).output().await {
            Ok(output) if output.status.success() => {
                return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    format!("終了コード {}", output.status)
                } else {
                    stderr
                }
            }
            Err(e) => e.to_string(),
        };

        match context {
            Some(label) => Err(FetcherError::Execution {
                context: label.to_string(),
                message: failure,
            }),
            None => {
                debug!(command, error = %failure, "コマンド失敗（無視）");
                Ok(String::new())
            }
        }
    }
}

/// シェル引数としてシングルクォートで囲む
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
