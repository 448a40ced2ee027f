#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Folder inventory collection for the folio agent
//!
//! Walks a synchronized folder and produces the flat entry listing that
//! snapshot manifests and the file-browsing surface are built from. Pure and
//! synchronous; callers that care run it on a blocking task.

mod tree;

pub use tree::build_tree;

use chrono::{DateTime, Utc};
use folio_errors::{Error, InventoryError};
use folio_types::FileEntry;
use std::path::Path;
use walkdir::WalkDir;

/// Collect a flat inventory of `root`, relative paths `/`-separated.
///
/// `max_depth` bounds how many path components below `root` are visited;
/// `0` means unlimited. Anything deeper is pruned wholesale. Entries that
/// fail to stat (permissions, deleted mid-walk) are skipped, not fatal.
/// The root itself is not part of the listing.
///
/// # Errors
///
/// Returns `InventoryError::WalkFailed` when `root` is not a readable
/// directory at all.
pub fn collect(root: &Path, max_depth: usize) -> Result<Vec<FileEntry>, Error> {
    let meta = std::fs::metadata(root).map_err(|e| InventoryError::WalkFailed {
        path: root.display().to_string(),
        message: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(InventoryError::WalkFailed {
            path: root.display().to_string(),
            message: "not a directory".to_string(),
        }
        .into());
    }

    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if max_depth > 0 {
        walker = walker.max_depth(max_depth);
    }

    let mut entries = Vec::new();
    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };
        let Ok(meta) = item.metadata() else {
            tracing::debug!(path = %item.path().display(), "skipping entry without metadata");
            continue;
        };
        let Ok(rel) = item.path().strip_prefix(root) else {
            continue;
        };

        let mod_time = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        entries.push(FileEntry {
            name: item.file_name().to_string_lossy().into_owned(),
            path: normalize(rel),
            size: meta.len(),
            is_directory: meta.is_dir(),
            mod_time,
        });
    }

    Ok(entries)
}

/// Relative path as a `/`-separated string, regardless of platform.
fn normalize(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top.txt"), b"top").unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/one.txt"), b"1").unwrap();
        fs::write(dir.path().join("a/b/two.txt"), b"22").unwrap();
        fs::write(dir.path().join("a/b/c/three.txt"), b"333").unwrap();
        dir
    }

    #[test]
    fn unlimited_depth_sees_everything() {
        let dir = fixture();
        let entries = collect(dir.path(), 0).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"top.txt"));
        assert!(paths.contains(&"a/b/c/three.txt"));
        assert_eq!(entries.len(), 7);
    }

    #[test]
    fn depth_one_prunes_entire_subtrees() {
        let dir = fixture();
        let entries = collect(dir.path(), 1).unwrap();
        let mut paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["a", "top.txt"]);
    }

    #[test]
    fn sizes_and_flags_are_recorded() {
        let dir = fixture();
        let entries = collect(dir.path(), 0).unwrap();
        let three = entries.iter().find(|e| e.path == "a/b/c/three.txt").unwrap();
        assert_eq!(three.size, 3);
        assert!(!three.is_directory);
        let a = entries.iter().find(|e| e.path == "a").unwrap();
        assert!(a.is_directory);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(collect(&gone, 0).is_err());
    }
}
