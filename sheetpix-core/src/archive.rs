//! Archive unpacking into an exclusive scratch directory

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tempfile::TempDir;
use zip::ZipArchive;

use crate::error::ExtractError;

/// Scratch location for an unpacked archive, removed when dropped
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `root`, or the system temp dir
    pub fn create(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sheetpix-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Expand the whole archive at `archive_path` into `dest`.
///
/// Returns the number of entries in the archive.
pub fn unpack(archive_path: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let file = File::open(archive_path).map_err(|source| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let invalid = |source| ExtractError::InvalidArchive {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(invalid)?;
    let entries = archive.len();
    archive.extract(dest).map_err(invalid)?;

    Ok(entries)
}
