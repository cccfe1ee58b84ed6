use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};

use super::{split_unit, Chunk, Chunker, LoadAndSplit};
use crate::error::{LoaderError, Result};

/// Word (.docx) loader. The whole document is one unit.
pub struct WordLoader {
    bytes: Vec<u8>,
    filename: String,
}

impl WordLoader {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Body paragraph texts in document order, newline-joined.
    /// Tables and other non-paragraph blocks are not part of the text.
    pub fn extract_text(&self) -> Result<String> {
        let doc = docx_rs::read_docx(&self.bytes).map_err(|e| LoaderError::parse("Word", e))?;

        let paragraphs: Vec<String> = doc
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
                _ => None,
            })
            .collect();

        tracing::debug!(
            "[WordLoader] {} paragraphs from {}",
            paragraphs.len(),
            self.filename
        );
        Ok(paragraphs.join("\n"))
    }
}

impl LoadAndSplit for WordLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        let text = self.extract_text()?;
        Ok(split_unit(text, &self.filename, None, chunker))
    }
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut output = String::new();
    for child in &para.children {
        match child {
            ParagraphChild::Run(run) => push_run(run, &mut output),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(run, &mut output);
                    }
                }
            }
            _ => {}
        }
    }
    output
}

fn push_run(run: &Run, output: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => output.push_str(&text.text),
            RunChild::Tab(_) => output.push('\t'),
            RunChild::Break(_) => output.push('\n'),
            _ => {}
        }
    }
}
