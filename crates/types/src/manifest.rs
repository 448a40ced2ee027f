//! Inventory entries and the snapshot manifest uploaded to the cloud

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry in a folder inventory.
///
/// `path` is relative to the inventoried root and always `/`-separated,
/// regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub is_directory: bool,
    pub mod_time: DateTime<Utc>,
}

/// Folder status as reported by the sync daemon.
///
/// The daemon reports more fields than these; only `state` and `path` drive
/// agent behavior, the rest is carried through opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub path: PathBuf,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FolderStatus {
    /// Whether the daemon is still busy scanning or replicating the folder.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.state.as_str(), "scanning" | "syncing")
    }
}

/// Point-in-time inventory of a project folder, serialized and uploaded as
/// the snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotManifest {
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<FileEntry>,
    pub file_count: u64,
    pub total_size: u64,
    pub sync_status: FolderStatus,
}

impl SnapshotManifest {
    /// Build a manifest from a collected inventory, computing the aggregates.
    #[must_use]
    pub fn new(project_id: impl Into<String>, files: Vec<FileEntry>, sync_status: FolderStatus) -> Self {
        let total_size = files.iter().filter(|f| !f.is_directory).map(|f| f.size).sum();
        Self {
            project_id: project_id.into(),
            created_at: Utc::now(),
            file_count: files.len() as u64,
            total_size,
            files,
            sync_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, size: u64, dir: bool) -> FileEntry {
        FileEntry {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            size,
            is_directory: dir,
            mod_time: Utc::now(),
        }
    }

    #[test]
    fn manifest_aggregates_skip_directories() {
        let files = vec![entry("a.txt", 10, false), entry("sub", 4096, true), entry("sub/b.txt", 32, false)];
        let manifest = SnapshotManifest::new("p", files, FolderStatus::default());
        assert_eq!(manifest.file_count, 3);
        assert_eq!(manifest.total_size, 42);
    }

    #[test]
    fn folder_status_busy_set() {
        let mut status = FolderStatus::default();
        for state in ["scanning", "syncing"] {
            status.state = state.to_string();
            assert!(status.is_busy());
        }
        status.state = "idle".to_string();
        assert!(!status.is_busy());
    }

    #[test]
    fn folder_status_keeps_unknown_fields() {
        let status: FolderStatus =
            serde_json::from_str(r#"{"state":"idle","path":"/tmp/p","globalFiles":12}"#).unwrap();
        assert_eq!(status.state, "idle");
        assert_eq!(status.extra.get("globalFiles").and_then(serde_json::Value::as_u64), Some(12));
    }
}
