//! Remote document storage
//!
//! [`RemoteStorage`] is the seam between the walker/loaders and the network.
//! [`graph::GraphDrive`] implements it against the Microsoft Graph drive API;
//! tests use an in-memory drive.

pub mod credentials;
pub mod graph;
pub mod http_client;
pub mod node;

#[cfg(test)]
pub(crate) mod testing;

pub use credentials::{ClientCredentials, CredentialProvider, StaticToken};
pub use graph::{DriveInfo, GraphClient, GraphDrive};
pub use node::{FileFacet, Node, NodeKind};

use std::fs;
use std::path::Path;

use crate::error::{LoaderError, Result};

/// Folder id addressing the drive root
pub const ROOT_FOLDER: &str = "root";

/// One page of a folder listing
#[derive(Debug, Clone, Default)]
pub struct NodePage {
    pub nodes: Vec<Node>,
    /// Continuation token for the next page; `None` once exhausted
    pub next: Option<String>,
}

/// Read access to one drive
pub trait RemoteStorage {
    /// Fetch one page of `folder_id`'s children. Pass the previous page's
    /// `next` as `continuation` to get the following page.
    fn list_children(&self, folder_id: &str, continuation: Option<&str>) -> Result<NodePage>;

    /// Fetch a single item, with a freshly issued download locator for files
    fn file_metadata(&self, file_id: &str) -> Result<Node>;

    /// Download the raw bytes behind a locator
    fn fetch_bytes(&self, download_locator: &str) -> Result<Vec<u8>>;

    /// Download the bytes behind a locator straight into `target`, creating or
    /// truncating it. Returns the number of bytes written. A transfer that
    /// fails midway leaves no partial file behind.
    fn fetch_to_file(&self, download_locator: &str, target: &Path) -> Result<u64> {
        let bytes = self.fetch_bytes(download_locator)?;
        fs::write(target, &bytes).map_err(|e| LoaderError::local_io(target, e))?;
        Ok(bytes.len() as u64)
    }

    /// All children of `folder_id`, following continuation tokens in page order
    fn list_all_children(&self, folder_id: &str) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self.list_children(folder_id, continuation.as_deref())?;
            nodes.extend(page.nodes);
            match page.next {
                Some(next) => continuation = Some(next),
                None => return Ok(nodes),
            }
        }
    }
}

impl<T: RemoteStorage + ?Sized> RemoteStorage for &T {
    fn list_children(&self, folder_id: &str, continuation: Option<&str>) -> Result<NodePage> {
        (**self).list_children(folder_id, continuation)
    }

    fn file_metadata(&self, file_id: &str) -> Result<Node> {
        (**self).file_metadata(file_id)
    }

    fn fetch_bytes(&self, download_locator: &str) -> Result<Vec<u8>> {
        (**self).fetch_bytes(download_locator)
    }

    fn fetch_to_file(&self, download_locator: &str, target: &Path) -> Result<u64> {
        (**self).fetch_to_file(download_locator, target)
    }
}
