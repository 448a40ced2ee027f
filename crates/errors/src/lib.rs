#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the folio agent
//!
//! Fine-grained error enums organized by domain, with a generic `Error` for
//! cross-crate boundaries. Retryability is a structural property of the error
//! (`Error::is_retryable`), never derived from message text.

use thiserror::Error;

pub mod config;
pub mod inventory;
pub mod network;
pub mod snapshot;
pub mod sync;
pub mod tracker;

pub use config::ConfigError;
pub use inventory::InventoryError;
pub use network::NetworkError;
pub use snapshot::SnapshotError;
pub use sync::SyncError;
pub use tracker::TrackerError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("sync daemon error: {0}")]
    Sync(#[from] SyncError),

    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether reattempting the failed operation could plausibly succeed.
    ///
    /// Only network errors carry a retryable classification; everything else
    /// fails fast.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Snapshot(SnapshotError::Serialization(err.to_string()))
    }
}
