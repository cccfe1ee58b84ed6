//! Separator-based text splitting

use super::{ChunkPiece, Chunker};
use crate::error::{LoaderError, Result};

/// Splits on a separator, then greedily merges the pieces back together into
/// chunks of at most `chunk_size` characters, repeating up to
/// `chunk_overlap` characters of trailing pieces at the start of the next one.
#[derive(Debug, Clone)]
pub struct CharacterTextSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            separator: "\n\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl CharacterTextSplitter {
    pub fn new(separator: impl Into<String>, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap > chunk_size {
            return Err(LoaderError::Config(format!(
                "chunk overlap ({}) is larger than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let splits: Vec<&str> = if self.separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(self.separator.as_str())
                .filter(|s| !s.is_empty())
                .collect()
        };
        self.merge(&splits)
    }

    fn merge(&self, splits: &[&str]) -> Vec<String> {
        let separator_len = self.separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = piece.chars().count();
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "[CharacterTextSplitter] Created a chunk of {} chars, longer than the limit of {}",
                        total,
                        self.chunk_size
                    );
                }
                if !current.is_empty() {
                    self.push_chunk(&current, &mut chunks);
                    // drop leading pieces until what remains fits as overlap
                    loop {
                        let joiner = if current.is_empty() { 0 } else { separator_len };
                        let too_long = total > 0 && total + len + joiner > self.chunk_size;
                        if total <= self.chunk_overlap && !too_long {
                            break;
                        }
                        let first = current.remove(0);
                        let joiner = if current.is_empty() { 0 } else { separator_len };
                        total -= first.chars().count() + joiner;
                    }
                }
            }

            let joiner = if current.is_empty() { 0 } else { separator_len };
            current.push(piece);
            total += len + joiner;
        }

        self.push_chunk(&current, &mut chunks);
        chunks
    }

    fn push_chunk(&self, pieces: &[&str], chunks: &mut Vec<String>) {
        let text = pieces.join(self.separator.as_str());
        let text = text.trim();
        if !text.is_empty() {
            chunks.push(text.to_string());
        }
    }
}

impl Chunker for CharacterTextSplitter {
    fn chunk(&self, text: &str) -> Vec<ChunkPiece> {
        self.split_text(text).into_iter().map(ChunkPiece::new).collect()
    }
}
