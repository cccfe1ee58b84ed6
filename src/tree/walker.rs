//! Remote tree walker
//!
//! Depth-first, pre-order traversal of a drive subtree. A folder is always
//! emitted immediately before its descendants. Traversal keeps an explicit
//! stack of pending child lists instead of recursing, so arbitrarily deep
//! libraries cannot exhaust the call stack.

use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use super::path::{resolve, ResolvedPath};
use crate::error::{ErrorKind, LoaderError, Result};
use crate::remote::{Node, RemoteStorage};

/// Ids of files already fetched during one download traversal
pub type DownloadedSet = HashSet<String>;

/// Path shown for the folder a traversal started from
const START_FOLDER_LABEL: &str = ".";

/// A listed node together with its resolved path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedNode {
    #[serde(flatten)]
    pub node: Node,
    #[serde(flatten)]
    pub path: ResolvedPath,
}

/// A file or folder that could not be processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Resolved remote path of the file or folder that failed
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(path: &str, err: &LoaderError) -> Self {
        Self {
            path: path.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a tree download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Relative paths of files written
    pub succeeded: Vec<String>,
    /// Relative paths of files already fetched earlier in the traversal
    pub skipped: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, path: &str, err: &LoaderError) {
        self.failed.push(ItemFailure::new(path, err));
    }
}

/// Children of one folder still to be visited
struct Frame {
    children: IntoIter<Node>,
    depth: usize,
}

impl Frame {
    fn new(children: Vec<Node>, depth: usize) -> Self {
        Self {
            children: children.into_iter(),
            depth,
        }
    }
}

pub struct TreeWalker<R> {
    remote: R,
    /// Maximum depth to descend (0 = unlimited). Children of the start folder are depth 1.
    max_depth: usize,
}

impl<R: RemoteStorage> TreeWalker<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            max_depth: 0,
        }
    }

    /// Stop expanding folders below `depth` (0 = unlimited)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    fn can_descend(&self, depth: usize) -> bool {
        self.max_depth == 0 || depth < self.max_depth
    }

    /// Enumerate the subtree under `folder_id` in pre-order.
    ///
    /// Any failed page fetch fails the whole call; nothing partial is returned.
    pub fn list_tree(&self, folder_id: &str) -> Result<Vec<ListedNode>> {
        let mut listed = Vec::new();
        let mut stack = vec![Frame::new(self.remote.list_all_children(folder_id)?, 1)];

        while let Some(frame) = stack.last_mut() {
            let Some(node) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth;
            let path = resolve(&node);
            let expand = node.is_folder() && self.can_descend(depth);
            let id = node.id.clone();

            listed.push(ListedNode { node, path });

            if expand {
                let children = self.remote.list_all_children(&id)?;
                stack.push(Frame::new(children, depth + 1));
            }
        }

        tracing::info!(
            "[TreeWalker] Listed {} nodes under {} ({} files)",
            listed.len(),
            folder_id,
            listed.iter().filter(|l| l.node.is_file()).count()
        );
        Ok(listed)
    }

    /// Mirror every file under `folder_id` into `local_root`, with a fresh
    /// dedup set for this call
    pub fn download_tree(&self, folder_id: &str, local_root: &Path) -> Result<DownloadReport> {
        let mut downloaded = DownloadedSet::new();
        self.download_tree_with(folder_id, local_root, &mut downloaded)
    }

    /// Like [`download_tree`](Self::download_tree), but files whose ids are in
    /// `downloaded` are skipped and newly fetched ids are added to it.
    ///
    /// Per-file failures and per-folder listing failures are recorded in the
    /// report and never stop the walk. Only an unusable `local_root` is an error.
    pub fn download_tree_with(
        &self,
        folder_id: &str,
        local_root: &Path,
        downloaded: &mut DownloadedSet,
    ) -> Result<DownloadReport> {
        fs::create_dir_all(local_root).map_err(|e| LoaderError::local_io(local_root, e))?;

        let mut report = DownloadReport::default();
        let mut stack = Vec::new();

        match self.remote.list_all_children(folder_id) {
            Ok(children) => stack.push(Frame::new(children, 1)),
            Err(err) => {
                tracing::error!(
                    "[TreeWalker] Failed to list {} ({}): {}",
                    folder_id,
                    err.kind(),
                    err
                );
                report.fail(START_FOLDER_LABEL, &err);
            }
        }

        while let Some(frame) = stack.last_mut() {
            let Some(node) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let depth = frame.depth;
            let path = resolve(&node);

            if node.is_folder() {
                let local_dir = path.local_path(local_root);
                if let Err(e) = fs::create_dir_all(&local_dir) {
                    let err = LoaderError::local_io(&local_dir, e);
                    tracing::error!("[TreeWalker] Cannot create {}: {}", local_dir.display(), err);
                    report.fail(&path.relative_path, &err);
                    continue;
                }
                if !self.can_descend(depth) {
                    continue;
                }
                match self.remote.list_all_children(&node.id) {
                    Ok(children) => stack.push(Frame::new(children, depth + 1)),
                    Err(err) => {
                        tracing::error!(
                            "[TreeWalker] Failed to list folder {} ({}), skipping its subtree: {}",
                            path,
                            err.kind(),
                            err
                        );
                        report.fail(&path.relative_path, &err);
                    }
                }
                continue;
            }

            if downloaded.contains(&node.id) {
                tracing::info!("[TreeWalker] Skipping already downloaded file: {} ({})", path, node.id);
                report.skipped.push(path.relative_path);
                continue;
            }

            match self.download_node(&node, &path.local_path(local_root)) {
                Ok(bytes) => {
                    tracing::info!("[TreeWalker] Downloaded {} ({} bytes)", path, bytes);
                    downloaded.insert(node.id);
                    report.succeeded.push(path.relative_path);
                }
                Err(err) => {
                    tracing::warn!(
                        "[TreeWalker] Failed to download {} ({}): {}",
                        path,
                        err.kind(),
                        err
                    );
                    report.fail(&path.relative_path, &err);
                }
            }
        }

        tracing::info!(
            "[TreeWalker] Download of {} finished: {} written, {} skipped, {} failed",
            folder_id,
            report.succeeded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Download a single file by id into `local_dir`, under its remote name
    pub fn download_file(&self, file_id: &str, local_dir: &Path) -> Result<PathBuf> {
        let node = self.remote.file_metadata(file_id)?;
        let target = local_dir.join(&node.name);
        self.download_node(&node, &target)?;
        tracing::info!("[TreeWalker] File downloaded: {}", target.display());
        Ok(target)
    }

    /// Fetch a fresh locator, then stream the bytes into `target`
    fn download_node(&self, node: &Node, target: &Path) -> Result<u64> {
        let fresh = self.remote.file_metadata(&node.id)?;
        let locator = fresh.download_locator().ok_or_else(|| {
            LoaderError::remote(None, format!("{} has no download locator", node.id))
        })?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| LoaderError::local_io(parent, e))?;
        }
        self.remote.fetch_to_file(locator, target)
    }
}
