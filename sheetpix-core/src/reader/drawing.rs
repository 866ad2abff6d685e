//! Drawing anchor parsing: which picture sits in which cell

use anyhow::Result;
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use std::path::{Path, PathBuf};

use super::parser_utils::{OoxmlNs, read_part, rels_path_for, resolve_target};
use super::relationships::read_relationships;

/// A picture anchored in a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAnchor {
    /// Relationship id of the picture (`r:embed` on `a:blip`)
    pub embed_id: String,
    /// 0-based column of the anchor origin
    pub col: u32,
    /// 0-based row of the anchor origin
    pub row: u32,
}

/// The part holding a sheet's anchors plus its relationship file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingPart {
    pub xml: PathBuf,
    pub rels: PathBuf,
}

/// Path of the worksheet part for a 1-based sheet index
pub fn worksheet_path(package_root: &Path, sheet_index: usize) -> PathBuf {
    package_root
        .join("xl/worksheets")
        .join(format!("sheet{}.xml", sheet_index))
}

/// Find the drawing part of a worksheet.
///
/// Follows the worksheet's `drawing` relationship when there is one,
/// otherwise the worksheet part itself is treated as the anchor source.
pub fn locate_drawing(package_root: &Path, sheet_index: usize) -> DrawingPart {
    let sheet_xml = worksheet_path(package_root, sheet_index);
    let sheet_rels = rels_path_for(&sheet_xml);

    if sheet_rels.exists() {
        match read_relationships(&sheet_rels) {
            Ok(rels) => {
                let drawing = rels
                    .iter()
                    .filter(|rel| !rel.external && rel.rel_type.ends_with("/drawing"))
                    .filter_map(|rel| resolve_target(package_root, &sheet_xml, &rel.target))
                    .find(|path| path.is_file());
                if let Some(drawing) = drawing {
                    let rels = rels_path_for(&drawing);
                    return DrawingPart { xml: drawing, rels };
                }
            }
            Err(e) => log::warn!(
                "Failed to read relationships of sheet{}.xml: {:#}",
                sheet_index,
                e
            ),
        }
    }

    DrawingPart {
        xml: sheet_xml,
        rels: sheet_rels,
    }
}

#[derive(Clone, Copy)]
enum AnchorField {
    Col,
    Row,
}

/// Parse picture anchors from a drawing (or worksheet) part.
///
/// Each `pic` inside a `twoCellAnchor`, `oneCellAnchor` or `absoluteAnchor`
/// takes the anchor's `from/col` and `from/row`; missing or non-numeric
/// values read as 0.
pub fn parse_anchors(xml: &str) -> Result<Vec<ImageAnchor>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut anchors = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut origin = (0u32, 0u32);
    let mut in_from = false;
    let mut in_pic = false;
    let mut field: Option<AnchorField> = None;

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (OoxmlNs::from_resolved(&ns), event),
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
        };

        match event {
            Event::Start(e) => match (ns, e.local_name().as_ref()) {
                (OoxmlNs::SpreadsheetDrawing, b"twoCellAnchor")
                | (OoxmlNs::SpreadsheetDrawing, b"oneCellAnchor")
                | (OoxmlNs::SpreadsheetDrawing, b"absoluteAnchor") => {
                    flush(&mut anchors, &mut pending, origin);
                    origin = (0, 0);
                }
                (OoxmlNs::SpreadsheetDrawing, b"from") => in_from = true,
                (OoxmlNs::SpreadsheetDrawing, b"col") if in_from => {
                    origin.0 = 0;
                    field = Some(AnchorField::Col);
                }
                (OoxmlNs::SpreadsheetDrawing, b"row") if in_from => {
                    origin.1 = 0;
                    field = Some(AnchorField::Row);
                }
                (OoxmlNs::SpreadsheetDrawing, b"pic") => in_pic = true,
                (OoxmlNs::DrawingMl, b"blip") if in_pic => {
                    if let Some(embed) = blip_embed(&reader, &e)? {
                        pending.push(embed);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if in_pic && ns == OoxmlNs::DrawingMl && e.local_name().as_ref() == b"blip" {
                    if let Some(embed) = blip_embed(&reader, &e)? {
                        pending.push(embed);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(current) = field {
                    let value = t
                        .unescape()
                        .ok()
                        .and_then(|text| text.trim().parse::<u32>().ok())
                        .unwrap_or(0);
                    match current {
                        AnchorField::Col => origin.0 = value,
                        AnchorField::Row => origin.1 = value,
                    }
                }
            }
            Event::End(e) => match (ns, e.local_name().as_ref()) {
                (OoxmlNs::SpreadsheetDrawing, b"twoCellAnchor")
                | (OoxmlNs::SpreadsheetDrawing, b"oneCellAnchor")
                | (OoxmlNs::SpreadsheetDrawing, b"absoluteAnchor") => {
                    flush(&mut anchors, &mut pending, origin);
                    origin = (0, 0);
                }
                (OoxmlNs::SpreadsheetDrawing, b"from") => in_from = false,
                (OoxmlNs::SpreadsheetDrawing, b"col") | (OoxmlNs::SpreadsheetDrawing, b"row") => {
                    field = None
                }
                (OoxmlNs::SpreadsheetDrawing, b"pic") => in_pic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    flush(&mut anchors, &mut pending, origin);
    Ok(anchors)
}

fn flush(anchors: &mut Vec<ImageAnchor>, pending: &mut Vec<String>, origin: (u32, u32)) {
    anchors.extend(pending.drain(..).map(|embed_id| ImageAnchor {
        embed_id,
        col: origin.0,
        row: origin.1,
    }));
}

/// `r:embed` of a blip, matched by namespace rather than prefix
fn blip_embed(reader: &NsReader<&[u8]>, blip: &BytesStart) -> Result<Option<String>> {
    for attr in blip.attributes() {
        let attr = attr?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if OoxmlNs::from_resolved(&ns) == OoxmlNs::OfficeRelationships
            && local.as_ref() == b"embed"
        {
            let value = attr.unescape_value()?.into_owned();
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}

/// Anchors of a drawing part; empty when the part is missing or unparsable
pub fn read_anchors(path: &Path) -> Vec<ImageAnchor> {
    if !path.exists() {
        log::debug!("No drawing part at {}", path.display());
        return Vec::new();
    }

    match read_part(path).and_then(|xml| parse_anchors(&xml)) {
        Ok(anchors) => anchors,
        Err(e) => {
            log::warn!("Failed to parse anchors in {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}
