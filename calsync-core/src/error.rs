//! Error types for calsync.

use thiserror::Error;

/// Errors that can occur in calsync operations.
#[derive(Error, Debug)]
pub enum CalSyncError {
    #[error("ICS format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
