//! Pipeline error taxonomy.

use thiserror::Error;

use smint_ledger::LedgerError;
use smint_media::MediaError;
use smint_models::{SegmentationError, TaskInputError};
use smint_sources::SourceError;
use smint_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Source duration {duration_secs}s exceeds the {limit_secs}s limit")]
    DurationExceeded { duration_secs: f64, limit_secs: u64 },

    #[error("No stream available: {0}")]
    NoStreamAvailable(String),

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("Extraction failed (exit code {exit_code:?}): {message}")]
    Extraction {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::UpstreamFetch(err.to_string())
    }

    /// Short category name used in reports and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::DurationExceeded { .. } => "duration_exceeded",
            PipelineError::NoStreamAvailable(_) => "no_stream_available",
            PipelineError::UpstreamFetch(_) => "upstream_fetch",
            PipelineError::Extraction { .. } => "extraction",
            PipelineError::Publish(_) => "publish",
            PipelineError::Commit(_) => "commit",
            PipelineError::Config(_) => "config",
            PipelineError::Timeout(_) => "timeout",
            PipelineError::Io(_) => "io",
        }
    }

    /// Errors that abort the whole run when raised before segmentation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_)
                | PipelineError::DurationExceeded { .. }
                | PipelineError::NoStreamAvailable(_)
                | PipelineError::UpstreamFetch(_)
                | PipelineError::Config(_)
                | PipelineError::Timeout(_)
        )
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::InvalidLink(e) => PipelineError::Validation(e.to_string()),
            SourceError::DurationExceeded {
                duration_secs,
                limit_secs,
            } => PipelineError::DurationExceeded {
                duration_secs,
                limit_secs,
            },
            SourceError::NoStreamAvailable { container } => PipelineError::NoStreamAvailable(container),
            SourceError::Config(msg) => PipelineError::Config(msg),
            other => PipelineError::UpstreamFetch(other.to_string()),
        }
    }
}

impl From<MediaError> for PipelineError {
    fn from(err: MediaError) -> Self {
        PipelineError::Extraction {
            exit_code: err.exit_code(),
            message: err.to_string(),
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => PipelineError::Config(msg),
            other => PipelineError::Publish(other.to_string()),
        }
    }
}

impl From<LedgerError> for PipelineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Config(msg) => PipelineError::Config(msg),
            other => PipelineError::Commit(other.to_string()),
        }
    }
}

impl From<TaskInputError> for PipelineError {
    fn from(err: TaskInputError) -> Self {
        PipelineError::Validation(err.to_string())
    }
}

impl From<SegmentationError> for PipelineError {
    fn from(err: SegmentationError) -> Self {
        PipelineError::Validation(err.to_string())
    }
}
