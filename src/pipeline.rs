//! Fetch-then-parse of remote documents
//!
//! Ties the remote side to the loaders: one file by id, or every file of a
//! subtree. Bytes are kept in memory only; nothing touches the local disk.

use serde::Serialize;

use crate::documents::{dispatch, Chunk, Chunker, Dispatch, LoadAndSplit};
use crate::error::{LoaderError, Result};
use crate::remote::{Node, RemoteStorage};
use crate::tree::{ItemFailure, TreeWalker};

/// Outcome of loading every file of a subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub chunks: Vec<Chunk>,
    /// Relative paths of files that produced chunks
    pub loaded: Vec<String>,
    /// Relative paths of files with no loader for their type
    pub unsupported: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Download one file and run it through its format loader.
///
/// `filename` becomes `metadata.source` of every chunk. Returns `None` when no
/// loader handles `mime_type`.
pub fn load_file<R: RemoteStorage>(
    remote: &R,
    file_id: &str,
    filename: &str,
    mime_type: &str,
    chunker: Option<&dyn Chunker>,
) -> Result<Option<Vec<Chunk>>> {
    let fresh = remote.file_metadata(file_id)?;
    load_node(remote, &fresh, filename, mime_type, chunker)
}

/// Like [`load_file`], with name and MIME type taken from the item's own
/// metadata. The fetched node is returned alongside the chunks.
pub fn load_file_by_id<R: RemoteStorage>(
    remote: &R,
    file_id: &str,
    chunker: Option<&dyn Chunker>,
) -> Result<(Node, Option<Vec<Chunk>>)> {
    let node = remote.file_metadata(file_id)?;
    let mime_type = node.mime_type().unwrap_or_default();
    let chunks = load_node(remote, &node, &node.name, mime_type, chunker)?;
    Ok((node, chunks))
}

/// Fetch and parse the bytes behind an already-fetched node
fn load_node<R: RemoteStorage>(
    remote: &R,
    fresh: &Node,
    filename: &str,
    mime_type: &str,
    chunker: Option<&dyn Chunker>,
) -> Result<Option<Vec<Chunk>>> {
    let locator = fresh
        .download_locator()
        .ok_or_else(|| LoaderError::remote(None, format!("{} has no download locator", fresh.id)))?;
    let bytes = remote.fetch_bytes(locator)?;
    tracing::debug!("[Pipeline] Fetched {} ({} bytes)", filename, bytes.len());

    match dispatch(bytes, filename, mime_type) {
        Dispatch::Loader(loader) => {
            let chunks = loader.load_and_split(chunker)?;
            tracing::info!(
                "[Pipeline] Loaded {} as {}: {} chunks",
                filename,
                loader.format().as_str(),
                chunks.len()
            );
            Ok(Some(chunks))
        }
        Dispatch::Unsupported { .. } => Ok(None),
    }
}

/// Load every file under `folder_id`, in traversal order.
///
/// Listing the tree must succeed as a whole. After that, a file that cannot
/// be fetched, decoded or parsed is logged and recorded, and the rest still load.
pub fn load_tree<R: RemoteStorage>(
    remote: &R,
    folder_id: &str,
    chunker: Option<&dyn Chunker>,
) -> Result<LoadReport> {
    let listed = TreeWalker::new(remote).list_tree(folder_id)?;
    let mut report = LoadReport::default();

    for entry in listed.iter().filter(|l| l.node.is_file()) {
        let path = &entry.path.relative_path;
        let mime_type = entry.node.mime_type().unwrap_or_default();

        match load_file(remote, &entry.node.id, path, mime_type, chunker) {
            Ok(Some(chunks)) => {
                report.chunks.extend(chunks);
                report.loaded.push(path.clone());
            }
            Ok(None) => report.unsupported.push(path.clone()),
            Err(err) => {
                tracing::warn!("[Pipeline] Failed to load {} ({}): {}", path, err.kind(), err);
                report.failed.push(ItemFailure::new(path, &err));
            }
        }
    }

    tracing::info!(
        "[Pipeline] Loaded {} of {} files under {} ({} chunks, {} unsupported, {} failed)",
        report.loaded.len(),
        listed.iter().filter(|l| l.node.is_file()).count(),
        folder_id,
        report.chunks.len(),
        report.unsupported.len(),
        report.failed.len()
    );
    Ok(report)
}
