use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("ingest error: {0}")]
    Ingest(#[from] ingest::IngestError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("classification catalog request failed: {0}")]
    CatalogRequest(String),
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
