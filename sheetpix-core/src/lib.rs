//! sheetpix-core: extract the images of an XLSX workbook into
//! `<output>/<sheet>/<column>/image_N.ext` buckets.
//!
//! Images are matched to columns through the drawing anchors of each sheet
//! when the package provides them, and spread evenly over the sheet's
//! header columns otherwise.

pub mod archive;
pub mod categorize;
pub mod config;
pub mod error;
pub mod media;
pub mod progress;
pub mod reader;
pub mod report;
pub mod writer;

use std::fs;
use std::path::Path;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use progress::{NoProgress, Progress, ProgressSink};
pub use report::{ExtractionReport, SheetReport};

use archive::{ScratchDir, unpack};
use categorize::Categorizer;
use media::MediaLibrary;
use progress::emit;
use reader::{HeaderReader, Manifest, locate_drawing, read_anchors};
use writer::BucketWriter;

/// Main extraction interface
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Create an extractor with default configuration
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Create an extractor with custom configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract and categorize every image of the workbook at `archive`.
    ///
    /// Only a missing or invalid archive (or an unusable output/scratch
    /// location) fails the run; everything below that degrades to defaults.
    /// The scratch directory is gone when this returns, whatever the outcome.
    pub fn extract<P: AsRef<Path>>(
        &self,
        archive: P,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractionReport, ExtractError> {
        let archive = archive.as_ref();
        emit(
            progress,
            Progress::Started {
                archive: archive.to_path_buf(),
            },
        );

        let result = self.run(archive, progress);
        match &result {
            Ok(_) => emit(
                progress,
                Progress::Finished {
                    output_dir: self.config.output_dir.clone(),
                },
            ),
            Err(e) => emit(
                progress,
                Progress::Failed {
                    message: e.to_string(),
                },
            ),
        }
        result
    }

    fn run(
        &self,
        archive: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractionReport, ExtractError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| ExtractError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let scratch = ScratchDir::create(self.config.scratch_root.as_deref())
            .map_err(ExtractError::Scratch)?;
        log::debug!("Scratch directory: {}", scratch.path().display());

        let outcome = self.process(archive, scratch.path(), progress);

        match scratch.close() {
            Ok(()) => emit(progress, Progress::CleanedUp),
            Err(e) => emit(
                progress,
                Progress::CleanupFailed {
                    error: e.to_string(),
                },
            ),
        }

        outcome
    }

    fn process(
        &self,
        archive: &Path,
        package_root: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ExtractionReport, ExtractError> {
        emit(progress, Progress::Unpacking);
        let entries = unpack(archive, package_root)?;
        emit(progress, Progress::Unpacked { entries });

        let mut report = ExtractionReport {
            output_dir: self.config.output_dir.clone(),
            ..Default::default()
        };

        let Some(media) = MediaLibrary::open(package_root) else {
            emit(progress, Progress::NoMediaDirectory);
            return Ok(report);
        };
        report.media_count = media.files().len();
        emit(
            progress,
            Progress::MediaFound {
                dir: media.dir().to_path_buf(),
                count: report.media_count,
            },
        );

        let manifest = Manifest::new(package_root);
        let sheet_names = manifest.sheet_names(&self.config.default_sheet_name);
        let mut headers = HeaderReader::open(archive, self.config.synthetic_column_count);
        let writer = BucketWriter::new(&self.config.output_dir, self.config.sanitize_names);
        let categorizer = Categorizer::new(
            package_root,
            &media,
            &writer,
            &self.config.fallback_bucket,
            progress,
        );

        for sheet in &sheet_names {
            let index = manifest.sheet_index(sheet);
            emit(
                progress,
                Progress::SheetStarted {
                    sheet: sheet.clone(),
                    index,
                },
            );

            let drawing = locate_drawing(package_root, index);
            let anchors = if drawing.xml.exists() {
                read_anchors(&drawing.xml)
            } else {
                emit(
                    progress,
                    Progress::DrawingMissing {
                        sheet: sheet.clone(),
                        path: drawing.xml.clone(),
                    },
                );
                Vec::new()
            };

            let mut sheet_report = SheetReport::new(sheet, index);
            sheet_report.columns = headers.column_names(sheet);
            sheet_report.anchors = anchors.len();
            emit(
                progress,
                Progress::ColumnsDetected {
                    sheet: sheet.clone(),
                    columns: sheet_report.columns.clone(),
                },
            );

            categorizer.categorize_sheet(&mut sheet_report, &drawing, &anchors);
            report.sheets.push(sheet_report);
        }

        Ok(report)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
