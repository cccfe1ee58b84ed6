//! Remote filesystem entries
//!
//! A [`Node`] is whatever a folder listing returned, reduced to the fields the
//! walker and the loaders need. Nodes are never persisted; they live for the
//! duration of one traversal.

use serde::Serialize;

/// File-only attributes. Folders carry none of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    /// Declared MIME type, used for parser dispatch
    pub mime_type: String,
    /// Pre-authenticated, time-limited URL (or content endpoint) for the bytes.
    /// Resolve shortly before use; it may have expired by the time a long walk
    /// gets back to it.
    pub download_locator: String,
}

/// Kind of a remote entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    File(FileFacet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Server-reported path of the containing folder, e.g. `/drives/b!x/root:/Reports`
    pub parent_path: Option<String>,
}

impl Node {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            parent_path: None,
        }
    }

    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        download_locator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File(FileFacet {
                mime_type: mime_type.into(),
                download_locator: download_locator.into(),
            }),
            parent_path: None,
        }
    }

    pub fn with_parent_path(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = Some(parent_path.into());
        self
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File(_))
    }

    pub fn mime_type(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File(facet) => Some(facet.mime_type.as_str()),
            NodeKind::Folder => None,
        }
    }

    pub fn download_locator(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File(facet) => Some(facet.download_locator.as_str()),
            NodeKind::Folder => None,
        }
    }
}
