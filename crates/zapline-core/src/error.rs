use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZaplineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("tables error: {0}")]
    Tables(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
