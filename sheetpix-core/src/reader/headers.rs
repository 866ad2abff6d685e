//! Column header names read through calamine

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Synthetic name for the column at 0-based `index` (`列1`, `列2`, ...)
pub fn placeholder_name(index: usize) -> String {
    format!("列{}", index + 1)
}

/// `count` synthetic column names
pub fn synthetic_columns(count: usize) -> Vec<String> {
    (0..count).map(placeholder_name).collect()
}

/// Name of the column at `index`, synthetic when past the header list
pub fn column_name_at(columns: &[String], index: usize) -> String {
    columns
        .get(index)
        .cloned()
        .unwrap_or_else(|| placeholder_name(index))
}

/// Row 1 of `range`, from column A to the last used column
pub fn header_row(range: &Range<Data>) -> Vec<String> {
    let last_col = range.end().map(|(_, col)| col).unwrap_or(0);

    (0..=last_col)
        .map(|col| match range.get_value((0, col)) {
            Some(value) if is_populated(value) => value.to_string(),
            _ => placeholder_name(col as usize),
        })
        .collect()
}

/// Whether a header cell counts as a name; empty text, zero and `false` don't
fn is_populated(value: &Data) -> bool {
    match value {
        Data::Empty => false,
        Data::String(s) => !s.is_empty(),
        Data::Int(i) => *i != 0,
        Data::Float(f) => *f != 0.0,
        Data::Bool(b) => *b,
        Data::DateTimeIso(s) | Data::DurationIso(s) => !s.is_empty(),
        Data::DateTime(_) | Data::Error(_) => true,
    }
}

/// Reads header rows from the original workbook file
pub struct HeaderReader {
    workbook: Option<Sheets<BufReader<File>>>,
    synthetic_count: usize,
}

impl HeaderReader {
    /// Open the workbook; failures are logged and every lookup then yields
    /// `synthetic_count` placeholder names.
    pub fn open(path: &Path, synthetic_count: usize) -> Self {
        let workbook = match open_workbook_auto(path) {
            Ok(workbook) => Some(workbook),
            Err(e) => {
                log::warn!(
                    "Failed to open workbook {} for column names: {}",
                    path.display(),
                    e
                );
                None
            }
        };

        Self {
            workbook,
            synthetic_count,
        }
    }

    /// Header names of `sheet_name`, or synthetic names when the sheet is
    /// unknown or unreadable
    pub fn column_names(&mut self, sheet_name: &str) -> Vec<String> {
        let Some(workbook) = self.workbook.as_mut() else {
            return synthetic_columns(self.synthetic_count);
        };

        if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
            log::warn!("Sheet '{}' not found in workbook data", sheet_name);
            return synthetic_columns(self.synthetic_count);
        }

        match workbook.worksheet_range(sheet_name) {
            Ok(range) => header_row(&range),
            Err(e) => {
                log::warn!("Failed to read header row of '{}': {}", sheet_name, e);
                synthetic_columns(self.synthetic_count)
            }
        }
    }
}
