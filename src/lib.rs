//! App Icon Fetcher
//!
//! データファイルに載っている macOS アプリのアイコンを取得し、
//! 表示名とアイコン名をデータファイルへ書き戻す。

pub mod batch;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod icon;
pub mod report;
pub mod resolver;

pub use error::{FailureKind, FetcherError, Result};
