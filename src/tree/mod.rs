//! Remote tree traversal and local mirroring

pub mod path;
pub mod walker;

pub use path::{resolve, ResolvedPath, ROOT_SENTINEL};
pub use walker::{DownloadReport, DownloadedSet, ItemFailure, ListedNode, TreeWalker};
