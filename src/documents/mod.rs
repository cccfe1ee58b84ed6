//! Document loaders
//!
//! Turns downloaded bytes into [`Chunk`]s. Each format has its own loader;
//! [`dispatch`] picks one from the declared MIME type.
//!
//! ## Supported Formats
//! - PDF: one unit per page via pdf-extract
//! - Word (.docx): whole document via docx-rs
//! - Excel (.xlsx): one unit per sheet via calamine
//! - PowerPoint (.pptx): one unit per slide, read straight from the OOXML package
//! - Text / CSV: whole file, encoding detected with chardetng
//!
//! Without a chunker every logical unit becomes exactly one chunk. With one,
//! each unit is handed to it and every piece gets `source` (and `page`)
//! stamped over whatever the chunker attached.

pub mod dispatch;
pub mod excel;
pub mod pdf;
pub mod powerpoint;
pub mod splitter;
pub mod text;
pub mod word;

#[cfg(test)]
pub(crate) mod fixtures;

pub use dispatch::{dispatch, Dispatch, DocumentFormat, DocumentLoader};
pub use splitter::CharacterTextSplitter;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Where inside a document a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageRef {
    /// 1-indexed slide or PDF page
    Number(u32),
    /// Excel sheet name
    Sheet(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMetadata {
    /// Originating file name
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageRef>,
    /// Anything the chunker attached besides `source`/`page`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One unit of extracted text. Created fresh per load, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A piece produced by a [`Chunker`], before source stamping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkPiece {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl ChunkPiece {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Splits one unit of text into pieces
pub trait Chunker {
    fn chunk(&self, text: &str) -> Vec<ChunkPiece>;
}

impl<F> Chunker for F
where
    F: Fn(&str) -> Vec<ChunkPiece>,
{
    fn chunk(&self, text: &str) -> Vec<ChunkPiece> {
        self(text)
    }
}

/// Common contract of every format loader
pub trait LoadAndSplit {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>>;

    /// One chunk per logical unit
    fn load(&self) -> Result<Vec<Chunk>> {
        self.load_and_split(None)
    }
}

/// Turn one logical unit into chunks, stamping `source`/`page` last
pub(crate) fn split_unit(
    text: String,
    source: &str,
    page: Option<PageRef>,
    chunker: Option<&dyn Chunker>,
) -> Vec<Chunk> {
    let Some(chunker) = chunker else {
        return vec![Chunk {
            text,
            metadata: ChunkMetadata {
                source: source.to_string(),
                page,
                extra: Map::new(),
            },
        }];
    };

    chunker
        .chunk(&text)
        .into_iter()
        .map(|piece| {
            let mut extra = piece.metadata;
            extra.remove("source");
            extra.remove("page");
            Chunk {
                text: piece.text,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    page: page.clone(),
                    extra,
                },
            }
        })
        .collect()
}
