//! Progress events reported while an extraction runs

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

/// A single step of an extraction run
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started { archive: PathBuf },
    Unpacking,
    Unpacked { entries: usize },
    NoMediaDirectory,
    MediaFound { dir: PathBuf, count: usize },
    SheetStarted { sheet: String, index: usize },
    DrawingMissing { sheet: String, path: PathBuf },
    ColumnsDetected { sheet: String, columns: Vec<String> },
    AnchorPlaced { file: String, column: String },
    ImageSaved { column: String, saved_as: String },
    CopyFailed { file: String, error: String },
    ColumnAssigned { column: String, count: usize },
    Distributed { sheet: String, total: usize },
    CleanedUp,
    CleanupFailed { error: String },
    Finished { output_dir: PathBuf },
    Failed { message: String },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Started { archive } => {
                write!(f, "Extracting images from {}...", archive.display())
            }
            Progress::Unpacking => write!(f, "Unpacking archive..."),
            Progress::Unpacked { entries } => write!(f, "Archive unpacked ({} entries)", entries),
            Progress::NoMediaDirectory => {
                write!(f, "No media directory found, the workbook has no images")
            }
            Progress::MediaFound { dir, count } => write!(
                f,
                "Found media directory {} with {} files",
                dir.display(),
                count
            ),
            Progress::SheetStarted { sheet, index } => {
                write!(f, "Processing sheet '{}' (#{})", sheet, index)
            }
            Progress::DrawingMissing { sheet, path } => write!(
                f,
                "  No drawing part for '{}' at {}, skipping anchor placement",
                sheet,
                path.display()
            ),
            Progress::ColumnsDetected { sheet, columns } => write!(
                f,
                "  Columns of '{}': {}",
                sheet,
                columns.join(", ")
            ),
            Progress::AnchorPlaced { file, column } => write!(f, "  {} -> {}", file, column),
            Progress::ImageSaved { column, saved_as } => {
                write!(f, "  Saved to {}: {}", column, saved_as)
            }
            Progress::CopyFailed { file, error } => {
                write!(f, "  Failed to save {}: {}", file, error)
            }
            Progress::ColumnAssigned { column, count } => {
                write!(f, "  {} images assigned to {}", count, column)
            }
            Progress::Distributed { sheet, total } => {
                write!(f, "  Distributed {} images across '{}'", total, sheet)
            }
            Progress::CleanedUp => write!(f, "Temporary files removed"),
            Progress::CleanupFailed { error } => {
                write!(f, "Failed to remove temporary files: {}", error)
            }
            Progress::Finished { output_dir } => {
                write!(f, "Image extraction complete: {}", output_dir.display())
            }
            Progress::Failed { message } => write!(f, "Extraction failed: {}", message),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink {
    fn report(&self, event: Progress);
}

impl<F: Fn(Progress)> ProgressSink for F {
    fn report(&self, event: Progress) {
        self(event)
    }
}

/// Relays events over a channel; a hung-up receiver is ignored
impl ProgressSink for Sender<Progress> {
    fn report(&self, event: Progress) {
        let _ = self.send(event);
    }
}

/// Discards every event
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: Progress) {}
}

/// Log `event` and hand it to `sink`
pub(crate) fn emit(sink: &dyn ProgressSink, event: Progress) {
    match &event {
        Progress::AnchorPlaced { .. } | Progress::ImageSaved { .. } => log::debug!("{}", event),
        Progress::CopyFailed { .. }
        | Progress::CleanupFailed { .. }
        | Progress::DrawingMissing { .. } => log::warn!("{}", event),
        Progress::Failed { .. } => log::error!("{}", event),
        _ => log::info!("{}", event),
    }
    sink.report(event);
}
