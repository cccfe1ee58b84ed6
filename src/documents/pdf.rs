use std::panic::{self, AssertUnwindSafe};

use super::{split_unit, Chunk, Chunker, LoadAndSplit, PageRef};
use crate::error::{LoaderError, Result};

/// PDF loader. Each page is one unit, numbered from 1.
pub struct PdfLoader {
    bytes: Vec<u8>,
    filename: String,
}

impl PdfLoader {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Text of each page in order. pdf-extract panics on some malformed
    /// documents, so the call is isolated.
    pub fn extract_pages(&self) -> Result<Vec<String>> {
        let bytes = self.bytes.as_slice();
        let pages = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }))
        .map_err(|_| LoaderError::parse("PDF", "parser panicked"))?
        .map_err(|e| LoaderError::parse("PDF", e))?;

        tracing::debug!(
            "[PdfLoader] {} pages from {}",
            pages.len(),
            self.filename
        );
        Ok(pages)
    }
}

impl LoadAndSplit for PdfLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for (index, text) in self.extract_pages()?.into_iter().enumerate() {
            let page = PageRef::Number(index as u32 + 1);
            chunks.extend(split_unit(text, &self.filename, Some(page), chunker));
        }
        Ok(chunks)
    }
}
