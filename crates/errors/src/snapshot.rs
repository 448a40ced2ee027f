//! Snapshot pipeline errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    /// Serializing the manifest failed. Internal defect, never retried.
    #[error("failed to serialize snapshot manifest: {0}")]
    Serialization(String),

    #[error("snapshot run timed out after {seconds} seconds")]
    RunTimeout { seconds: u64 },
}
