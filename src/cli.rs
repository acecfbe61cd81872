use crate::error::{FetcherError, Result};
use clap::Parser;
use dialoguer::Select;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "app-icon-fetcher", version)]
#[command(about = "macOSアプリのアイコンを取得してデータファイルを更新するツール", long_about = None)]
pub struct Cli {
    /// アイコンが無い・壊れているアプリのみ処理
    #[arg(short = 'm', long, conflicts_with = "all")]
    pub only_missing: bool,

    /// すべてのアプリを処理（表示名の更新を含む）
    #[arg(short, long)]
    pub all: bool,

    /// 詳細ログを出力
    #[arg(short, long)]
    pub verbose: bool,

    /// データファイル（デフォルト: toolSoftware/data.js）
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// アイコン出力ディレクトリ（デフォルト: toolSoftware/icons）
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 同時に処理するアプリ数
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// アイコンサイズ（px）
    #[arg(short, long)]
    pub size: Option<u32>,

    /// 失敗時のリトライ回数
    #[arg(long)]
    pub retries: Option<u32>,
}

/// 処理対象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    OnlyMissing,
    All,
}

impl ProcessMode {
    pub fn only_missing(&self) -> bool {
        matches!(self, ProcessMode::OnlyMissing)
    }
}

impl Cli {
    /// フラグで指定されたモード（未指定なら None）
    pub fn mode(&self) -> Option<ProcessMode> {
        if self.only_missing {
            Some(ProcessMode::OnlyMissing)
        } else if self.all {
            Some(ProcessMode::All)
        } else {
            None
        }
    }
}

/// 対話メニューでモードを選ぶ（キャンセル時は None）
pub fn prompt_mode() -> Result<Option<ProcessMode>> {
    let items = [
        "アイコンが無いアプリのみ処理",
        "すべてのアプリを処理（表示名も更新）",
    ];

    let selection = Select::new()
        .with_prompt("処理モードを選択してください")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|e| FetcherError::Prompt(e.to_string()))?;

    Ok(selection.map(|index| match index {
        0 => ProcessMode::OnlyMissing,
        _ => ProcessMode::All,
    }))
}
