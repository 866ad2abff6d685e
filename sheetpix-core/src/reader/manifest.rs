//! Workbook manifest (`xl/workbook.xml`) parsing

use anyhow::Result;
use quick_xml::NsReader;
use quick_xml::events::Event;
use std::path::{Path, PathBuf};

use super::parser_utils::{OoxmlNs, attr_value, read_part};

/// Location of the manifest inside the package
pub const MANIFEST_PART: &str = "xl/workbook.xml";

/// Parse the declared `<sheet>` entries in declaration order.
///
/// Entries without a `name` attribute keep their slot as an empty string so
/// positions stay aligned with the declaration order.
pub fn parse_sheet_entries(xml: &str) -> Result<Vec<String>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (OoxmlNs::from_resolved(&ns), event),
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
        };

        match event {
            Event::Start(e) | Event::Empty(e)
                if ns == OoxmlNs::SpreadsheetMl && e.local_name().as_ref() == b"sheet" =>
            {
                entries.push(attr_value(&e, b"name")?.unwrap_or_default());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Strict 1-based lookup of a sheet among the declared entries
pub fn lookup_sheet_index(xml: &str, sheet_name: &str) -> Result<Option<usize>> {
    Ok(parse_sheet_entries(xml)?
        .iter()
        .position(|name| name == sheet_name)
        .map(|position| position + 1))
}

/// Manifest of an unpacked package
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(package_root: &Path) -> Self {
        Self {
            path: package_root.join(MANIFEST_PART),
        }
    }

    /// Sheet names in declaration order, or `[default_sheet]` when the
    /// manifest is missing, unreadable or declares no named sheets.
    pub fn sheet_names(&self, default_sheet: &str) -> Vec<String> {
        if !self.path.exists() {
            log::warn!(
                "Workbook manifest {} not found, assuming a single sheet '{}'",
                self.path.display(),
                default_sheet
            );
            return vec![default_sheet.to_string()];
        }

        match read_part(&self.path).and_then(|xml| parse_sheet_entries(&xml)) {
            Ok(entries) => {
                let names: Vec<String> = entries.into_iter().filter(|n| !n.is_empty()).collect();
                if names.is_empty() {
                    log::warn!("Workbook manifest declares no sheets, using '{}'", default_sheet);
                    vec![default_sheet.to_string()]
                } else {
                    names
                }
            }
            Err(e) => {
                log::warn!("Failed to read sheet names: {:#}", e);
                vec![default_sheet.to_string()]
            }
        }
    }

    /// 1-based position of `sheet_name`; falls back to 1 when the sheet is
    /// not declared or the manifest cannot be parsed.
    pub fn sheet_index(&self, sheet_name: &str) -> usize {
        match read_part(&self.path).and_then(|xml| lookup_sheet_index(&xml, sheet_name)) {
            Ok(Some(index)) => index,
            Ok(None) => {
                log::warn!(
                    "Sheet '{}' is not declared in the manifest, using sheet index 1",
                    sheet_name
                );
                1
            }
            Err(e) => {
                log::warn!(
                    "Failed to resolve index of sheet '{}', using sheet index 1: {:#}",
                    sheet_name,
                    e
                );
                1
            }
        }
    }
}
