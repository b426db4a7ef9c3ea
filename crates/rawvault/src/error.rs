//! Error types for the ingestion engine.

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(#[from] rawvault_db::DbError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Reference hub unavailable: {0}")]
    HubUnavailable(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl VaultError {
    /// True when the error means shared storage is unusable and the whole
    /// run must stop, as opposed to a single file being unreadable.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, Self::Db(_) | Self::HubUnavailable(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, VaultError>;
