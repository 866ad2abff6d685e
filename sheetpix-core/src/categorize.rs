//! Assignment of media files to (sheet, column) buckets
//!
//! Two phases run per sheet. Anchored pictures whose embed resolves to a
//! media file go to the column of their anchor. Afterwards every media file
//! of the package is spread evenly over the sheet's columns, whether or not
//! it was already placed, so each sheet receives the whole media set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::media::MediaLibrary;
use crate::progress::{Progress, ProgressSink, emit};
use crate::reader::drawing::{DrawingPart, ImageAnchor};
use crate::reader::headers::column_name_at;
use crate::reader::relationships::resolve_embed;
use crate::report::SheetReport;
use crate::writer::BucketWriter;

/// Images per column when `total` files are spread over `columns` columns:
/// `total / columns` each, one extra for the first `total % columns`.
pub fn distribution(total: usize, columns: usize) -> Vec<usize> {
    if columns == 0 {
        return Vec::new();
    }
    let base = total / columns;
    let remainder = total % columns;
    (0..columns)
        .map(|col| if col < remainder { base + 1 } else { base })
        .collect()
}

/// Places the images of one package into buckets
pub struct Categorizer<'a> {
    package_root: &'a Path,
    media: &'a MediaLibrary,
    writer: &'a BucketWriter,
    fallback_bucket: &'a str,
    progress: &'a dyn ProgressSink,
}

impl<'a> Categorizer<'a> {
    pub fn new(
        package_root: &'a Path,
        media: &'a MediaLibrary,
        writer: &'a BucketWriter,
        fallback_bucket: &'a str,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            package_root,
            media,
            writer,
            fallback_bucket,
            progress,
        }
    }

    /// Run both phases for a sheet
    pub fn categorize_sheet(
        &self,
        report: &mut SheetReport,
        drawing: &DrawingPart,
        anchors: &[ImageAnchor],
    ) {
        report.exact_placed = self.place_anchored(report, drawing, anchors);
        self.distribute(report);
    }

    /// Exact phase: save each anchored picture into its anchor's column.
    ///
    /// A media file is saved at most once per sheet in this phase. Returns
    /// the number of anchors that were placed.
    pub fn place_anchored(
        &self,
        report: &mut SheetReport,
        drawing: &DrawingPart,
        anchors: &[ImageAnchor],
    ) -> usize {
        let mut processed: HashSet<PathBuf> = HashSet::new();
        let sheet = report.name.clone();
        let columns = report.columns.clone();

        for anchor in anchors {
            let Some(file) = resolve_embed(
                self.package_root,
                &drawing.xml,
                &drawing.rels,
                &anchor.embed_id,
                self.media,
            ) else {
                log::debug!("Dropping anchor {} without media", anchor.embed_id);
                continue;
            };
            if processed.contains(&file) {
                continue;
            }

            let column = column_name_at(&columns, anchor.col as usize);
            self.save(report, &file, &sheet, &column);
            emit(
                self.progress,
                Progress::AnchorPlaced {
                    file: display_name(&file),
                    column,
                },
            );
            processed.insert(file);
        }

        processed.len()
    }

    /// Smart phase: spread every media file over the sheet's columns.
    ///
    /// With fewer than two columns everything goes to the first column, or
    /// to the fallback bucket when there is none. Returns the number of
    /// files handed out.
    pub fn distribute(&self, report: &mut SheetReport) -> usize {
        let files = self.media.files();
        if files.is_empty() {
            return 0;
        }

        let sheet = report.name.clone();
        let columns = report.columns.clone();

        if columns.len() < 2 {
            let column = columns
                .first()
                .cloned()
                .unwrap_or_else(|| self.fallback_bucket.to_string());
            for file in &files {
                self.save(report, file, &sheet, &column);
            }
            emit(
                self.progress,
                Progress::ColumnAssigned {
                    column,
                    count: files.len(),
                },
            );
            emit(
                self.progress,
                Progress::Distributed {
                    sheet,
                    total: files.len(),
                },
            );
            return files.len();
        }

        let mut next = 0;
        for (column, count) in columns.iter().zip(distribution(files.len(), columns.len())) {
            for file in &files[next..next + count] {
                self.save(report, file, &sheet, column);
            }
            next += count;
            emit(
                self.progress,
                Progress::ColumnAssigned {
                    column: column.clone(),
                    count,
                },
            );
        }

        emit(self.progress, Progress::Distributed { sheet, total: next });
        next
    }

    fn save(&self, report: &mut SheetReport, file: &Path, sheet: &str, column: &str) {
        match self.writer.save(file, sheet, column) {
            Ok(saved) => {
                report.record_saved(column);
                emit(
                    self.progress,
                    Progress::ImageSaved {
                        column: column.to_string(),
                        saved_as: display_name(&saved),
                    },
                );
            }
            Err(e) => {
                report.failed_copies += 1;
                emit(
                    self.progress,
                    Progress::CopyFailed {
                        file: display_name(file),
                        error: e.to_string(),
                    },
                );
            }
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::fs;

    #[test]
    fn test_distribution_bounds_and_sum() {
        for total in 0..40 {
            for columns in 1..12 {
                let counts = distribution(total, columns);
                assert_eq!(counts.len(), columns);
                assert_eq!(counts.iter().sum::<usize>(), total);
                let floor = total / columns;
                assert!(counts.iter().all(|&c| c == floor || c == floor + 1));
                // Extras go to the leading columns
                assert!(counts.windows(2).all(|w| w[0] >= w[1]));
            }
        }
        assert_eq!(distribution(5, 3), vec![2, 2, 1]);
        assert_eq!(distribution(1, 26)[0], 1);
        assert!(distribution(3, 0).is_empty());
    }

    struct Package {
        dir: tempfile::TempDir,
    }

    impl Package {
        fn new(images: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("pkg");
            fs::create_dir_all(root.join("xl/media")).unwrap();
            fs::create_dir_all(root.join("xl/drawings/_rels")).unwrap();
            for i in 1..=images {
                fs::write(
                    root.join(format!("xl/media/image{}.png", i)),
                    format!("image-{}", i),
                )
                .unwrap();
            }
            Self { dir }
        }

        fn root(&self) -> PathBuf {
            self.dir.path().join("pkg")
        }

        fn out(&self) -> PathBuf {
            self.dir.path().join("out")
        }

        fn drawing(&self) -> DrawingPart {
            DrawingPart {
                xml: self.root().join("xl/drawings/drawing1.xml"),
                rels: self.root().join("xl/drawings/_rels/drawing1.xml.rels"),
            }
        }

        fn bucket_len(&self, sheet: &str, column: &str) -> usize {
            fs::read_dir(self.out().join(sheet).join(column))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn report_with(columns: &[&str]) -> SheetReport {
        let mut report = SheetReport::new("Sheet1", 1);
        report.columns = columns.iter().map(|c| c.to_string()).collect();
        report
    }

    #[test]
    fn test_distribute_even_split_in_header_order() {
        let package = Package::new(5);
        let root = package.root();
        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let mut report = report_with(&["Front", "Back", "Side"]);
        assert_eq!(categorizer.distribute(&mut report), 5);

        assert_eq!(package.bucket_len("Sheet1", "Front"), 2);
        assert_eq!(package.bucket_len("Sheet1", "Back"), 2);
        assert_eq!(package.bucket_len("Sheet1", "Side"), 1);
        assert_eq!(
            fs::read(package.out().join("Sheet1/Side/image_1.png")).unwrap(),
            b"image-5"
        );
        assert_eq!(report.count_for("Front"), 2);
    }

    #[test]
    fn test_distribute_single_and_zero_columns() {
        let package = Package::new(3);
        let root = package.root();
        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let mut single = report_with(&["Only"]);
        assert_eq!(categorizer.distribute(&mut single), 3);
        assert_eq!(package.bucket_len("Sheet1", "Only"), 3);

        let mut none = report_with(&[]);
        none.name = "Empty".to_string();
        assert_eq!(categorizer.distribute(&mut none), 3);
        assert_eq!(package.bucket_len("Empty", "其他"), 3);
    }

    #[test]
    fn test_anchor_placement_uses_anchor_column() {
        let package = Package::new(3);
        let root = package.root();
        fs::write(
            root.join("xl/drawings/_rels/drawing1.xml.rels"),
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image3.png"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image2.png"/>
</Relationships>"#,
        )
        .unwrap();
        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let anchors = vec![
            ImageAnchor {
                embed_id: "rId1".to_string(),
                col: 1,
                row: 3,
            },
            ImageAnchor {
                embed_id: "rId2".to_string(),
                col: 7,
                row: 3,
            },
            // Same media file again: skipped
            ImageAnchor {
                embed_id: "rId1".to_string(),
                col: 0,
                row: 9,
            },
        ];
        let mut report = report_with(&["Front", "Back"]);
        let placed = categorizer.place_anchored(&mut report, &package.drawing(), &anchors);

        assert_eq!(placed, 2);
        assert_eq!(
            fs::read(package.out().join("Sheet1/Back/image_1.png")).unwrap(),
            b"image-3"
        );
        assert_eq!(
            fs::read(package.out().join("Sheet1/列8/image_1.png")).unwrap(),
            b"image-2"
        );
        assert_eq!(package.bucket_len("Sheet1", "Front"), 0);
    }

    #[test]
    fn test_unresolvable_anchors_all_fall_back_to_first_media_file() {
        let package = Package::new(2);
        let root = package.root();
        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let anchors = vec![
            ImageAnchor {
                embed_id: "rId1".to_string(),
                col: 0,
                row: 1,
            },
            ImageAnchor {
                embed_id: "rId2".to_string(),
                col: 1,
                row: 1,
            },
        ];
        let mut report = report_with(&["Front", "Back"]);
        let placed = categorizer.place_anchored(&mut report, &package.drawing(), &anchors);

        // Both resolve to image1.png; the second is skipped as already processed
        assert_eq!(placed, 1);
        assert_eq!(
            fs::read(package.out().join("Sheet1/Front/image_1.png")).unwrap(),
            b"image-1"
        );
        assert_eq!(package.bucket_len("Sheet1", "Back"), 0);
    }

    #[test]
    fn test_failed_copies_are_counted_and_skipped() {
        let package = Package::new(4);
        let root = package.root();
        // A plain file where the bucket directory should go
        fs::create_dir_all(package.out().join("S")).unwrap();
        fs::write(package.out().join("S/A"), b"blocker").unwrap();

        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let mut report = report_with(&["A", "B"]);
        report.name = "S".to_string();
        categorizer.distribute(&mut report);

        assert_eq!(report.failed_copies, 2);
        assert_eq!(report.column_counts, vec![("B".to_string(), 2)]);
        assert_eq!(package.bucket_len("S", "B"), 2);
        assert_eq!(
            fs::read(package.out().join("S/B/image_2.png")).unwrap(),
            b"image-4"
        );
    }

    #[test]
    fn test_smart_phase_reprocesses_anchored_files() {
        let package = Package::new(2);
        let root = package.root();
        fs::write(
            root.join("xl/drawings/_rels/drawing1.xml.rels"),
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#,
        )
        .unwrap();
        let media = MediaLibrary::open(&root).unwrap();
        let writer = BucketWriter::new(&package.out(), true);
        let categorizer = Categorizer::new(&root, &media, &writer, "其他", &NoProgress);

        let anchors = vec![ImageAnchor {
            embed_id: "rId1".to_string(),
            col: 1,
            row: 1,
        }];
        let mut report = report_with(&["Front", "Back"]);
        categorizer.categorize_sheet(&mut report, &package.drawing(), &anchors);

        assert_eq!(report.exact_placed, 1);
        // 1 exact + 1 smart in Back, 1 smart in Front
        assert_eq!(package.bucket_len("Sheet1", "Back"), 2);
        assert_eq!(package.bucket_len("Sheet1", "Front"), 1);
        assert_eq!(report.saved_total(), 3);
    }
}
