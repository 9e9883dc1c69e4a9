use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocsplitError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("not valid UTF-8: {path}")]
    NonUtf8 { path: String },

    #[error("parse error in {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("unsupported language: {lang}")]
    UnsupportedLanguage { lang: String },

    #[error("invalid token budget {budget}: must be greater than zero")]
    InvalidBudget { budget: i64 },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DocsplitError>;
