//! Network-related error types
//!
//! Classification is decided where the failure is observed (status code,
//! transport error kind) and carried structurally from then on.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    /// Transport failure that is neither a timeout nor a refused connection.
    /// Unclassified, so treated as fatal rather than retried blindly.
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("upload failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl NetworkError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport-level failures, timeouts, 429 and 5xx are retryable; other
    /// HTTP statuses (client/auth errors) and malformed responses are fatal,
    /// as is an already-exhausted retry loop.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) | Self::RateLimited { .. } => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::InvalidUrl(_)
            | Self::InvalidResponse(_)
            | Self::RequestFailed(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }
}
