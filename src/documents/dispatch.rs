//! MIME-type dispatch to format loaders
//!
//! The table is exact-match on the declared MIME type. Anything else is a
//! soft failure: [`Dispatch::Unsupported`] is returned and logged, because
//! real document libraries are full of attachments nobody can parse.

use serde::Serialize;

use super::excel::ExcelLoader;
use super::pdf::PdfLoader;
use super::powerpoint::PowerPointLoader;
use super::text::TextLoader;
use super::word::WordLoader;
use super::{Chunk, Chunker, LoadAndSplit};
use crate::error::{LoaderError, Result};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_WORD: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_POWERPOINT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_EXCEL: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_TEXT: &str = "text/plain";

/// Closed set of formats with a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Word,
    PowerPoint,
    Excel,
    Text,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 5] = [
        Self::Pdf,
        Self::Word,
        Self::PowerPoint,
        Self::Excel,
        Self::Text,
    ];

    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type {
            MIME_PDF => Some(Self::Pdf),
            MIME_WORD => Some(Self::Word),
            MIME_POWERPOINT => Some(Self::PowerPoint),
            MIME_EXCEL => Some(Self::Excel),
            MIME_CSV | MIME_TEXT => Some(Self::Text),
            _ => None,
        }
    }

    /// MIME types routed to this format
    pub fn mime_types(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &[MIME_PDF],
            Self::Word => &[MIME_WORD],
            Self::PowerPoint => &[MIME_POWERPOINT],
            Self::Excel => &[MIME_EXCEL],
            Self::Text => &[MIME_CSV, MIME_TEXT],
        }
    }

    /// Format implied by a file name's extension
    pub fn guess_from_name(filename: &str) -> Option<Self> {
        mime_guess::from_path(filename)
            .iter_raw()
            .find_map(Self::from_mime)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "Word",
            Self::PowerPoint => "PowerPoint",
            Self::Excel => "Excel",
            Self::Text => "text",
        }
    }

    fn loader(self, bytes: Vec<u8>, filename: String) -> DocumentLoader {
        match self {
            Self::Pdf => DocumentLoader::Pdf(PdfLoader::new(bytes, filename)),
            Self::Word => DocumentLoader::Word(WordLoader::new(bytes, filename)),
            Self::PowerPoint => DocumentLoader::PowerPoint(PowerPointLoader::new(bytes, filename)),
            Self::Excel => DocumentLoader::Excel(ExcelLoader::new(bytes, filename)),
            Self::Text => DocumentLoader::Text(TextLoader::new(bytes, filename)),
        }
    }
}

/// A loader for one downloaded file
pub enum DocumentLoader {
    Pdf(PdfLoader),
    Word(WordLoader),
    PowerPoint(PowerPointLoader),
    Excel(ExcelLoader),
    Text(TextLoader),
}

impl DocumentLoader {
    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::Pdf(_) => DocumentFormat::Pdf,
            Self::Word(_) => DocumentFormat::Word,
            Self::PowerPoint(_) => DocumentFormat::PowerPoint,
            Self::Excel(_) => DocumentFormat::Excel,
            Self::Text(_) => DocumentFormat::Text,
        }
    }

    fn inner(&self) -> &dyn LoadAndSplit {
        match self {
            Self::Pdf(loader) => loader,
            Self::Word(loader) => loader,
            Self::PowerPoint(loader) => loader,
            Self::Excel(loader) => loader,
            Self::Text(loader) => loader,
        }
    }
}

impl LoadAndSplit for DocumentLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        self.inner().load_and_split(chunker)
    }
}

/// Outcome of [`dispatch`]
pub enum Dispatch {
    Loader(DocumentLoader),
    Unsupported { mime_type: String },
}

impl Dispatch {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Loader(_))
    }

    /// Turn the soft failure into an `UnsupportedFormat` error
    pub fn into_loader(self) -> Result<DocumentLoader> {
        match self {
            Self::Loader(loader) => Ok(loader),
            Self::Unsupported { mime_type } => Err(LoaderError::UnsupportedFormat { mime_type }),
        }
    }
}

/// Pick the loader for a file.
///
/// Only an absent/empty `mime_type` falls back to guessing from `filename`;
/// a declared type outside the table is unsupported.
pub fn dispatch(bytes: Vec<u8>, filename: impl Into<String>, mime_type: &str) -> Dispatch {
    let filename = filename.into();
    let mime_type = mime_type.trim();

    let format = if mime_type.is_empty() {
        DocumentFormat::guess_from_name(&filename)
    } else {
        DocumentFormat::from_mime(mime_type)
    };

    match format {
        Some(format) => {
            tracing::debug!("[Dispatch] {} -> {} loader", filename, format.as_str());
            Dispatch::Loader(format.loader(bytes, filename))
        }
        None => {
            tracing::warn!(
                "[Dispatch] Unsupported file type {:?} for {}",
                mime_type,
                filename
            );
            Dispatch::Unsupported {
                mime_type: mime_type.to_string(),
            }
        }
    }
}
