//! Persistence of categorized images into bucket directories

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Writes images into `<output_root>/<sheet>/<column>/`
#[derive(Debug, Clone)]
pub struct BucketWriter {
    output_root: PathBuf,
    sanitize: bool,
}

impl BucketWriter {
    pub fn new(output_root: &Path, sanitize: bool) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            sanitize,
        }
    }

    /// Directory of the (sheet, column) bucket
    pub fn bucket_dir(&self, sheet: &str, column: &str) -> PathBuf {
        if self.sanitize {
            self.output_root
                .join(sanitize_path_component(sheet))
                .join(sanitize_path_component(column))
        } else {
            self.output_root.join(sheet).join(column)
        }
    }

    /// Copy `source` into the bucket as `image_{n}{ext}`, where `n - 1` is
    /// the number of entries already in the bucket
    pub fn save(&self, source: &Path, sheet: &str, column: &str) -> io::Result<PathBuf> {
        save_image(source, &self.bucket_dir(sheet, column))
    }
}

/// Copy `source` into `bucket`, creating it on first use
pub fn save_image(source: &Path, bucket: &Path) -> io::Result<PathBuf> {
    if !source.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a file", source.display()),
        ));
    }

    fs::create_dir_all(bucket)?;

    let existing = fs::read_dir(bucket)?.count();
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let destination = bucket.join(format!("image_{}{}", existing + 1, extension));

    fs::copy(source, &destination)?;
    if let Err(e) = preserve_modified_time(source, &destination) {
        log::debug!(
            "Could not preserve modification time of {}: {}",
            destination.display(),
            e
        );
    }

    Ok(destination)
}

fn preserve_modified_time(source: &Path, destination: &Path) -> io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    let file = OpenOptions::new().write(true).open(destination)?;
    file.set_modified(modified)
}

/// Turn a sheet or column name into a single safe directory name
pub fn sanitize_path_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
