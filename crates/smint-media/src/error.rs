//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use smint_models::ArtifactKind;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Transcoder not found: {0}")]
    TranscoderNotFound(String),

    #[error("Failed to launch {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcoder failed (exit code {exit_code:?}): {message}")]
    TranscodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Transcoder produced no output at {0}")]
    OutputMissing(PathBuf),

    #[error("Cannot extract artifact kind: {0}")]
    UnsupportedArtifact(ArtifactKind),

    #[error("Download failed: {message}")]
    DownloadFailed { message: String, status: Option<u16> },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MediaError {
    /// Create a transcoder failure error.
    pub fn transcode_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::TranscodeFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
            status,
        }
    }

    /// Exit code of the child process, when it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::TranscodeFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}
