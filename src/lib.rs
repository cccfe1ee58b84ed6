//! Walk SharePoint document libraries through Microsoft Graph, mirror them
//! locally, and turn their files into text chunks.
//!
//! - [`remote`]: Graph client and the [`remote::RemoteStorage`] seam
//! - [`tree`]: pre-order traversal, path resolution, tree download
//! - [`documents`]: MIME dispatch and per-format loaders
//! - [`pipeline`]: fetch-then-parse of one file or a whole subtree

pub mod cli;
pub mod config;
pub mod documents;
pub mod error;
pub mod pipeline;
pub mod remote;
pub mod tree;

pub use config::Config;
pub use documents::{dispatch, Chunk, ChunkMetadata, Chunker, Dispatch, LoadAndSplit, PageRef};
pub use error::{ErrorKind, LoaderError, Result};
pub use pipeline::{load_file, load_file_by_id, load_tree, LoadReport};
pub use remote::{GraphClient, GraphDrive, Node, RemoteStorage, ROOT_FOLDER};
pub use tree::{DownloadReport, DownloadedSet, ResolvedPath, TreeWalker};
