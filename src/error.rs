use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("アプリが見つかりません: {0}")]
    NotFound(String),

    #[error("アイコン抽出エラー: {0}")]
    Extraction(String),

    #[error("{context}: {message}")]
    Execution { context: String, message: String },

    #[error("アプリ名の取得に失敗: {0}")]
    NameRetrieval(String),

    #[error("実行環境エラー: {0}")]
    Environment(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] app_icon_common::Error),
}

impl FetcherError {
    /// 失敗一覧で使う分類
    pub fn kind(&self) -> FailureKind {
        match self {
            FetcherError::NotFound(_) => FailureKind::AppPath,
            FetcherError::Extraction(_) => FailureKind::IconExtraction,
            FetcherError::NameRetrieval(_) => FailureKind::NameRetrieval,
            _ => FailureKind::Other,
        }
    }
}

/// 失敗の分類（表示順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    IconExtraction,
    AppPath,
    NameRetrieval,
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 4] = [
        FailureKind::IconExtraction,
        FailureKind::AppPath,
        FailureKind::NameRetrieval,
        FailureKind::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::IconExtraction => "アイコン抽出の失敗",
            FailureKind::AppPath => "アプリパスが見つからない",
            FailureKind::NameRetrieval => "アプリ名の取得に失敗",
            FailureKind::Other => "その他のエラー",
        }
    }
}

pub type Result<T> = std::result::Result<T, FetcherError>;
