//! Configuration for the extractor

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main extractor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Root of the `<sheet>/<column>/image_N.ext` tree
    pub output_dir: PathBuf,
    /// Parent directory for the scratch location (system temp dir if unset)
    pub scratch_root: Option<PathBuf>,
    /// Sheet name used when the workbook manifest yields nothing
    pub default_sheet_name: String,
    /// Number of placeholder columns when header names can't be read
    pub synthetic_column_count: usize,
    /// Bucket for sheets without any detected column
    pub fallback_bucket: String,
    /// Replace path-hostile characters in sheet and column directory names
    pub sanitize_names: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("extracted_images"),
            scratch_root: None,
            default_sheet_name: "Sheet1".to_string(),
            synthetic_column_count: 26,
            fallback_bucket: "其他".to_string(),
            sanitize_names: true,
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ExtractorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject values the extractor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.synthetic_column_count == 0 {
            anyhow::bail!("Configuration error: synthetic_column_count must be at least 1");
        }
        if self.default_sheet_name.trim().is_empty() {
            anyhow::bail!("Configuration error: default_sheet_name must not be empty");
        }
        if self.fallback_bucket.trim().is_empty() {
            anyhow::bail!("Configuration error: fallback_bucket must not be empty");
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("Configuration error: output_dir must not be empty");
        }
        Ok(())
    }
}
