//! Hierarchical tree reconstruction from a flat inventory
//!
//! Parent resolution is component-wise: an entry hangs off the longest
//! ancestor *path segment prefix* that is itself a listed directory, falling
//! back to the root. Plain string-prefix matching would conflate siblings
//! like `src` and `src2`.

use folio_types::{FileEntry, NodeKind, TreeNode};
use std::collections::{HashMap, HashSet};

/// Build a tree from a flat inventory listing.
///
/// Entries whose immediate parent directory is missing from the listing
/// (pruned or skipped during the walk) attach to their nearest listed
/// ancestor instead of being dropped.
#[must_use]
pub fn build_tree(entries: &[FileEntry]) -> TreeNode {
    let dirs: HashSet<&str> = entries
        .iter()
        .filter(|e| e.is_directory)
        .map(|e| e.path.as_str())
        .collect();

    let mut children: HashMap<&str, Vec<&FileEntry>> = HashMap::new();
    for entry in entries {
        if entry.path.is_empty() || entry.path == "." {
            continue;
        }
        children
            .entry(parent_of(&entry.path, &dirs))
            .or_default()
            .push(entry);
    }

    let mut root = TreeNode::root();
    root.children = attach("", &children);
    root
}

fn attach(parent: &str, children: &HashMap<&str, Vec<&FileEntry>>) -> Vec<TreeNode> {
    let Some(kids) = children.get(parent) else {
        return Vec::new();
    };
    kids.iter()
        .map(|entry| {
            let mut node = TreeNode {
                name: entry.name.clone(),
                path: entry.path.clone(),
                kind: if entry.is_directory {
                    NodeKind::Directory
                } else {
                    NodeKind::File
                },
                size: (!entry.is_directory).then_some(entry.size),
                mod_time: Some(entry.mod_time),
                children: Vec::new(),
            };
            if entry.is_directory {
                node.children = attach(&entry.path, children);
            }
            node
        })
        .collect()
}

/// Longest ancestor of `path` (by whole components) that is a listed
/// directory; empty string means the root.
fn parent_of<'a>(path: &'a str, dirs: &HashSet<&str>) -> &'a str {
    let mut end = path.len();
    while let Some(pos) = path[..end].rfind('/') {
        let candidate = &path[..pos];
        if dirs.contains(candidate) {
            return candidate;
        }
        end = pos;
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(path: &str, dir: bool) -> FileEntry {
        FileEntry {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            size: u64::from(!dir),
            is_directory: dir,
            mod_time: Utc::now(),
        }
    }

    fn find<'a>(node: &'a TreeNode, path: &str) -> Option<&'a TreeNode> {
        if node.path == path {
            return Some(node);
        }
        node.children.iter().find_map(|c| find(c, path))
    }

    #[test]
    fn nests_by_components() {
        let entries = vec![
            entry("src", true),
            entry("src/main.rs", false),
            entry("src/util", true),
            entry("src/util/io.rs", false),
            entry("README.md", false),
        ];
        let tree = build_tree(&entries);

        assert_eq!(tree.children.len(), 2); // src, README.md
        let io = find(&tree, "src/util/io.rs").unwrap();
        assert_eq!(io.kind, NodeKind::File);
        let util = find(&tree, "src/util").unwrap();
        assert_eq!(util.children.len(), 1);
    }

    #[test]
    fn sibling_prefixes_are_not_conflated() {
        // "src2/lib.rs" must not end up under "src".
        let entries = vec![
            entry("src", true),
            entry("src2", true),
            entry("src/main.rs", false),
            entry("src2/lib.rs", false),
        ];
        let tree = build_tree(&entries);

        let src = find(&tree, "src").unwrap();
        let src2 = find(&tree, "src2").unwrap();
        assert_eq!(src.children.len(), 1);
        assert_eq!(src.children[0].path, "src/main.rs");
        assert_eq!(src2.children.len(), 1);
        assert_eq!(src2.children[0].path, "src2/lib.rs");
    }

    #[test]
    fn missing_intermediate_attaches_to_nearest_listed_ancestor() {
        // "a/b" was skipped during the walk; its file attaches to "a".
        let entries = vec![entry("a", true), entry("a/b/deep.txt", false)];
        let tree = build_tree(&entries);

        let a = find(&tree, "a").unwrap();
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.children[0].path, "a/b/deep.txt");
    }

    #[test]
    fn orphans_fall_back_to_root() {
        let entries = vec![entry("lost/orphan.txt", false)];
        let tree = build_tree(&entries);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].path, "lost/orphan.txt");
    }

    #[test]
    fn empty_listing_gives_bare_root() {
        let tree = build_tree(&[]);
        assert!(tree.children.is_empty());
        assert!(tree.is_directory());
    }
}
