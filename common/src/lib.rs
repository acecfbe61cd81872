//! App Icon Fetcher Common Library
//!
//! OSに依存しないロジック（データモデル、データファイルのパースと差分書き戻し、
//! 表示名の採用ポリシー）

pub mod error;
pub mod types;
pub mod parser;
pub mod naming;
pub mod reconcile;
pub mod data_file;

pub use error::{Error, Result};
pub use types::{ApplicationRecord, Category, count_records};
pub use parser::parse_data_source;
pub use naming::{AdoptionPolicy, icon_file_name, strip_app_suffix, DEFAULT_MAX_NAME_LENGTH};
pub use reconcile::{reconcile, Reconciliation};
pub use data_file::DataFile;
