//! Common parsing utilities shared by the package part parsers

use anyhow::{Context, Result};
use quick_xml::events::BytesStart;
use quick_xml::name::{Namespace, ResolveResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const SPREADSHEETML_NS: &[u8] = b"http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub const STRICT_SPREADSHEETML_NS: &[u8] = b"http://purl.oclc.org/ooxml/spreadsheetml/main";
pub const SPREADSHEET_DRAWING_NS: &[u8] =
    b"http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const DRAWINGML_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";
pub const OFFICE_RELATIONSHIPS_NS: &[u8] =
    b"http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const PACKAGE_RELATIONSHIPS_NS: &[u8] =
    b"http://schemas.openxmlformats.org/package/2006/relationships";

/// Namespaces the parsers care about, resolved from a `quick_xml` lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OoxmlNs {
    SpreadsheetMl,
    SpreadsheetDrawing,
    DrawingMl,
    OfficeRelationships,
    PackageRelationships,
    Other,
}

impl OoxmlNs {
    pub fn from_resolved(resolved: &ResolveResult) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(ns)) => match *ns {
                SPREADSHEETML_NS | STRICT_SPREADSHEETML_NS => OoxmlNs::SpreadsheetMl,
                SPREADSHEET_DRAWING_NS => OoxmlNs::SpreadsheetDrawing,
                DRAWINGML_NS => OoxmlNs::DrawingMl,
                OFFICE_RELATIONSHIPS_NS => OoxmlNs::OfficeRelationships,
                PACKAGE_RELATIONSHIPS_NS => OoxmlNs::PackageRelationships,
                _ => OoxmlNs::Other,
            },
            _ => OoxmlNs::Other,
        }
    }
}

/// Read an unqualified attribute value from an element
pub fn attr_value(element: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Read a package part from the unpacked archive as UTF-8 text
pub fn read_part(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Path of the relationship part belonging to `part` (`dir/_rels/name.rels`)
pub fn rels_path_for(part: &Path) -> PathBuf {
    let file_name = part
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = part.parent().unwrap_or_else(|| Path::new(""));
    dir.join("_rels").join(format!("{}.rels", file_name))
}

/// Resolve a relationship target against the part that declared it.
///
/// Absolute targets (`/xl/media/image1.png`) are relative to the package
/// root, everything else to the directory of `part`. Returns `None` when the
/// normalized path would leave the package root.
pub fn resolve_target(package_root: &Path, part: &Path, target: &str) -> Option<PathBuf> {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        package_root.join(absolute)
    } else {
        part.parent().unwrap_or(package_root).join(target)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized.starts_with(package_root).then_some(normalized)
}
