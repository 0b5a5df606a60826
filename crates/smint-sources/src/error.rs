//! Source and oracle error types.

use thiserror::Error;

use smint_models::{InterestPeriodError, SourceIdError};

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid source link: {0}")]
    InvalidLink(#[from] SourceIdError),

    #[error("Source duration {duration_secs}s exceeds the {limit_secs}s limit")]
    DurationExceeded { duration_secs: f64, limit_secs: u64 },

    #[error("No {container} stream available")]
    NoStreamAvailable { container: String },

    #[error("{service} returned {status}: {body}")]
    RequestFailed {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("Interest period {index} rejected: {source}")]
    InvalidPeriod {
        index: usize,
        #[source]
        source: InterestPeriodError,
    },

    #[error("{0} request timed out")]
    Timeout(&'static str),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SourceError {
    pub fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    /// Whether the failure came from an unreachable or misbehaving upstream.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            SourceError::RequestFailed { .. }
                | SourceError::InvalidResponse { .. }
                | SourceError::InvalidPeriod { .. }
                | SourceError::Timeout(_)
                | SourceError::Network(_)
        )
    }
}

/// Map a transport error, keeping timeouts distinct.
pub(crate) fn transport(service: &'static str) -> impl Fn(reqwest::Error) -> SourceError {
    move |e| {
        if e.is_timeout() {
            SourceError::Timeout(service)
        } else {
            SourceError::Network(e)
        }
    }
}
