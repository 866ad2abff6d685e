//! Media directory (`xl/media`) enumeration

use regex::Regex;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Location of embedded media inside the package
pub const MEDIA_DIR: &str = "xl/media";

/// The media directory of an unpacked package
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    /// Open the media directory, `None` if the package has no media
    pub fn open(package_root: &Path) -> Option<Self> {
        let dir = package_root.join(MEDIA_DIR);
        dir.is_dir().then_some(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All media files in natural file-name order (`image2` before `image10`).
    ///
    /// Enumerated from disk on every call.
    pub fn files(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to list {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
        files
    }

    /// First media file in enumeration order
    pub fn first(&self) -> Option<PathBuf> {
        self.files().into_iter().next()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compare file names by stem prefix, then trailing number, then full name
fn natural_cmp(a: &str, b: &str) -> Ordering {
    static TRAILING_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = TRAILING_NUMBER.get_or_init(|| Regex::new(r"^(.*?)(\d+)(\.[^.]*)?$").unwrap());

    let key = |name: &str| -> (String, Option<u128>) {
        match re.captures(name) {
            Some(caps) => (
                caps[1].to_string(),
                caps[2].parse::<u128>().ok(),
            ),
            None => (name.to_string(), None),
        }
    };

    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}
