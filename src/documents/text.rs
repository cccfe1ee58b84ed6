use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use super::{split_unit, Chunk, Chunker, LoadAndSplit};
use crate::error::{LoaderError, Result};

/// Plain text and CSV loader. The whole file is one unit.
///
/// Files come from arbitrary uploaders, so the encoding is detected: a BOM
/// wins, otherwise chardetng guesses from the content.
pub struct TextLoader {
    bytes: Vec<u8>,
    filename: String,
}

impl TextLoader {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    pub fn detect_encoding(&self) -> &'static Encoding {
        if let Some((encoding, _)) = Encoding::for_bom(&self.bytes) {
            return encoding;
        }
        let mut detector = EncodingDetector::new();
        detector.feed(&self.bytes, true);
        detector.guess(None, true)
    }

    pub fn decode(&self) -> Result<String> {
        let encoding = self.detect_encoding();
        // decode() strips a matching BOM
        let (text, used, had_errors) = encoding.decode(&self.bytes);
        if had_errors {
            return Err(LoaderError::Decode {
                message: format!("{} is not valid {}", self.filename, used.name()),
            });
        }

        tracing::debug!(
            "[TextLoader] {} decoded as {}",
            self.filename,
            used.name()
        );
        Ok(text.into_owned())
    }
}

impl LoadAndSplit for TextLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        let text = self.decode()?;
        Ok(split_unit(text, &self.filename, None, chunker))
    }
}
