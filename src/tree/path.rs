//! Root-relative paths for remote nodes
//!
//! Graph reports a node's parent as `/drives/{id}/root:/A/B`. Everything up
//! to and including the `root:` marker is dropped. Paths are derived on every
//! call and never cached, since the server may move things between listings.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::remote::Node;

/// Marker that ends the drive-specific prefix of a parent path
pub const ROOT_SENTINEL: &str = "root:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPath {
    /// Containing folder, slash-separated, no leading slash; empty at the root
    pub parent: String,
    /// `parent/name`, or just `name` at the root
    pub relative_path: String,
}

impl ResolvedPath {
    /// Local path below `root`, one component per remote path segment
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.relative_path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }
}

impl std::fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relative_path)
    }
}

/// Resolve a node's path from its server-reported parent path
pub fn resolve(node: &Node) -> ResolvedPath {
    resolve_parts(node.parent_path.as_deref(), &node.name)
}

pub fn resolve_parts(parent_path: Option<&str>, name: &str) -> ResolvedPath {
    let parent = parent_path.map(strip_sentinel).unwrap_or_default();
    let relative_path = if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    };
    ResolvedPath {
        parent,
        relative_path,
    }
}

/// Drop everything through the first `root:`; without one, the whole string
/// is taken as already relative
fn strip_sentinel(parent_path: &str) -> String {
    let rest = match parent_path.find(ROOT_SENTINEL) {
        Some(pos) => &parent_path[pos + ROOT_SENTINEL.len()..],
        None => parent_path,
    };
    rest.trim_matches('/').to_string()
}
