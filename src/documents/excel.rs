use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

use super::{split_unit, Chunk, Chunker, LoadAndSplit, PageRef};
use crate::error::{LoaderError, Result};

/// Text used for a cell with no value
pub const EMPTY_CELL: &str = "";

/// Excel (.xlsx) loader. Each sheet is one unit, tagged with its name.
pub struct ExcelLoader {
    bytes: Vec<u8>,
    filename: String,
}

impl ExcelLoader {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// `(sheet name, text)` per sheet in workbook order. Every cell of the used
    /// range, row-major, newline-joined; empty cells become [`EMPTY_CELL`].
    ///
    /// The first row is emitted as data like any other. It is not taken as
    /// column labels, so header text appears in the output instead of being
    /// dropped.
    pub fn extract_sheets(&self) -> Result<Vec<(String, String)>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| LoaderError::parse("Excel", e))?;

        let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| LoaderError::parse("Excel", format!("sheet {}: {}", sheet_name, e)))?;

            let text = range
                .rows()
                .flat_map(|row| row.iter().map(cell_text))
                .collect::<Vec<_>>()
                .join("\n");
            sheets.push((sheet_name, text));
        }

        tracing::debug!(
            "[ExcelLoader] {} sheets from {}",
            sheets.len(),
            self.filename
        );
        Ok(sheets)
    }
}

impl LoadAndSplit for ExcelLoader {
    fn load_and_split(&self, chunker: Option<&dyn Chunker>) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for (sheet, text) in self.extract_sheets()? {
            chunks.extend(split_unit(
                text,
                &self.filename,
                Some(PageRef::Sheet(sheet)),
                chunker,
            ));
        }
        Ok(chunks)
    }
}

/// Date-formatted cells render as `YYYY-MM-DD HH:MM:SS` (durations as
/// `H:MM:SS`); the raw serial is used only when it is out of range.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => EMPTY_CELL.to_string(),
        Data::DateTime(dt) if dt.is_duration() => dt
            .as_duration()
            .map(|d| clock_text(d.num_seconds()))
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        other => other.to_string(),
    }
}

fn clock_text(total_seconds: i64) -> String {
    let sign = if total_seconds < 0 { "-" } else { "" };
    let secs = total_seconds.unsigned_abs();
    format!("{}{}:{:02}:{:02}", sign, secs / 3600, secs % 3600 / 60, secs % 60)
}
