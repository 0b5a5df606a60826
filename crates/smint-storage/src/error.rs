//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while publishing artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to configure storage client: {0}")]
    ConfigError(String),

    #[error("Upload rejected with status {status}: {body}")]
    UploadRejected { status: u16, body: String },

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),

    #[error("Upload timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
