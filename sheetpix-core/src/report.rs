//! Summary of an extraction run

use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionReport {
    pub output_dir: PathBuf,
    /// Files in the media directory (0 when there is none)
    pub media_count: usize,
    pub sheets: Vec<SheetReport>,
}

impl ExtractionReport {
    /// Images written across all sheets
    pub fn saved_total(&self) -> usize {
        self.sheets.iter().map(SheetReport::saved_total).sum()
    }

    pub fn failed_total(&self) -> usize {
        self.sheets.iter().map(|s| s.failed_copies).sum()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Outcome for one worksheet
#[derive(Debug, Clone, Default, Serialize)]
pub struct SheetReport {
    pub name: String,
    /// 1-based index used to locate the sheet's parts
    pub index: usize,
    pub columns: Vec<String>,
    /// Anchors found in the sheet's drawing part
    pub anchors: usize,
    /// Images placed through their anchor
    pub exact_placed: usize,
    /// Images saved per bucket, in first-write order
    pub column_counts: Vec<(String, usize)>,
    pub failed_copies: usize,
}

impl SheetReport {
    pub fn new(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            ..Default::default()
        }
    }

    pub(crate) fn record_saved(&mut self, column: &str) {
        match self.column_counts.iter_mut().find(|(name, _)| name == column) {
            Some((_, count)) => *count += 1,
            None => self.column_counts.push((column.to_string(), 1)),
        }
    }

    /// Images saved into `column`
    pub fn count_for(&self, column: &str) -> usize {
        self.column_counts
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn saved_total(&self) -> usize {
        self.column_counts.iter().map(|(_, count)| count).sum()
    }
}
