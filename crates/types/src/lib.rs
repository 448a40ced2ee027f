#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the folio agent
//!
//! This crate provides the shared data model: snapshot step/state tracking,
//! the manifest produced by an inventory run, and the file tree exposed to
//! observers. All wire-facing types serialize as camelCase JSON.

pub mod manifest;
pub mod snapshot;
pub mod tree;

pub use manifest::{FileEntry, FolderStatus, SnapshotManifest};
pub use snapshot::{progress_percent, OperationState, SnapshotOutcome, SnapshotStep, TOTAL_STEPS};
pub use tree::{NodeKind, TreeNode};
pub use uuid::Uuid;

/// Format a byte count for human-readable progress messages.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.2} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.2} MB", b as f64 / MB as f64),
        b => format!("{:.2} GB", b as f64 / GB as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
