//! Sync daemon collaboration errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("folder scan did not settle within {seconds} seconds")]
    ScanTimeout { seconds: u64 },

    #[error("folder not found: {folder_id}")]
    FolderNotFound { folder_id: String },

    #[error("daemon status query failed: {0}")]
    StatusUnavailable(String),
}
