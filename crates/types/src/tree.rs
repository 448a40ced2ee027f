//! Hierarchical file tree exposed to observers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node in the hierarchical view of an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub name: String,
    /// Relative `/`-separated path; empty for the synthetic root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl TreeNode {
    /// Synthetic root node that anchors a tree built from a flat inventory.
    #[must_use]
    pub fn root() -> Self {
        Self {
            name: "root".to_string(),
            path: String::new(),
            kind: NodeKind::Directory,
            size: None,
            mod_time: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
