//! Inventory collection errors

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("folder path not available for {folder_id}")]
    PathUnavailable { folder_id: String },

    #[error("cannot walk {path}: {message}")]
    WalkFailed { path: String, message: String },
}
