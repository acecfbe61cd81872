use anyhow::{Context, Result};
use app_icon_common::{count_records, DataFile};
use app_icon_fetcher::batch::BatchProcessor;
use app_icon_fetcher::cli::{prompt_mode, Cli, ProcessMode};
use app_icon_fetcher::config::Config;
use app_icon_fetcher::executor::ShellExecutor;
use app_icon_fetcher::icon::{IconLocator, SipsExtractor};
use app_icon_fetcher::resolver::{AppResolver, LookupCache};
use app_icon_fetcher::{environment, report};
use clap::Parser;
use std::process::exit;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer().compact().without_time().with_target(false);
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(layer).with(filter).init();

    if let Err(error) = run(cli).await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load().context("設定ファイルの読み込みに失敗")?;
    config.apply_cli(&cli);
    config.validate()?;

    println!("🖼  app-icon-fetcher - アプリアイコン取得\n");

    // 1. 環境チェック
    println!("[1/3] 実行環境を確認中...");
    environment::check_environment(&ShellExecutor, &config).await?;
    println!("✔ 環境チェック完了\n");

    let mode = match cli.mode() {
        Some(mode) => mode,
        None => match prompt_mode()? {
            Some(mode) => mode,
            None => {
                println!("キャンセルしました");
                return Ok(());
            }
        },
    };

    // 2. データファイル読み込み
    println!("[2/3] データファイルを読み込み中...");
    let data = DataFile::load(&config.data_path)
        .with_context(|| format!("データファイルを読み込めません: {}", config.data_path.display()))?;
    println!(
        "✔ {}分類 / {}件のアプリ\n",
        data.categories().len(),
        count_records(data.categories())
    );

    // 3. アイコン取得
    let label = match mode {
        ProcessMode::OnlyMissing => "アイコンが無いアプリ",
        ProcessMode::All => "すべてのアプリ",
    };
    println!("[3/3] {}を処理中...", label);

    let started = Instant::now();
    let cache = Arc::new(LookupCache::new());
    let processor = BatchProcessor::new(
        AppResolver::new(ShellExecutor, cache),
        IconLocator::new(ShellExecutor),
        SipsExtractor::new(ShellExecutor).with_min_bytes(config.min_icon_bytes),
        config.batch_options(mode.only_missing()),
    );
    let run_report = processor.run_and_save(&data).await?;
    let (paths, names) = processor.resolver().cache().len();
    debug!(paths, names, "ルックアップキャッシュ");

    print!("{}", report::render_summary(&run_report, started.elapsed()));
    println!("\n✅ 完了");

    Ok(())
}
