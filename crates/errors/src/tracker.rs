//! Operation tracker errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    /// A non-terminal operation already exists for the key. Callers either
    /// wait for it to finish or clean it up first.
    #[error("snapshot generation already running for {project_id}")]
    AlreadyRunning { project_id: String },
}
