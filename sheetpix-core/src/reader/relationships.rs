//! Package relationship (`*.rels`) parsing and embed resolution

use anyhow::Result;
use quick_xml::NsReader;
use quick_xml::events::Event;
use std::path::{Path, PathBuf};

use super::parser_utils::{OoxmlNs, attr_value, read_part, resolve_target};
use crate::media::MediaLibrary;

/// A single `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// Parse all relationships declared in a `.rels` part
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = Vec::new();
    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (OoxmlNs::from_resolved(&ns), event),
            Err(e) => return Err(anyhow::anyhow!("XML parsing error: {}", e)),
        };

        match event {
            Event::Start(e) | Event::Empty(e)
                if ns == OoxmlNs::PackageRelationships
                    && e.local_name().as_ref() == b"Relationship" =>
            {
                let Some(id) = attr_value(&e, b"Id")? else {
                    continue;
                };
                relationships.push(Relationship {
                    id,
                    rel_type: attr_value(&e, b"Type")?.unwrap_or_default(),
                    target: attr_value(&e, b"Target")?.unwrap_or_default(),
                    external: attr_value(&e, b"TargetMode")?.as_deref() == Some("External"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(relationships)
}

/// Read and parse a `.rels` file from the unpacked package
pub fn read_relationships(rels_path: &Path) -> Result<Vec<Relationship>> {
    parse_relationships(&read_part(rels_path)?)
}

/// Resolve an embed reference declared by `part` to a media file on disk.
///
/// When the relationship file is missing or unparsable, the id is unknown,
/// or the target does not exist, the first file of the media directory is
/// returned instead. That file is not necessarily related to the sheet.
pub fn resolve_embed(
    package_root: &Path,
    part: &Path,
    rels_path: &Path,
    embed_id: &str,
    media: &MediaLibrary,
) -> Option<PathBuf> {
    match resolve_embed_strict(package_root, part, rels_path, embed_id) {
        Ok(Some(path)) => return Some(path),
        Ok(None) => log::debug!(
            "Embed {} not resolvable through {}",
            embed_id,
            rels_path.display()
        ),
        Err(e) => log::warn!("Failed to resolve embed {}: {:#}", embed_id, e),
    }

    let fallback = media.first();
    if let Some(file) = &fallback {
        log::debug!("Embed {} falls back to {}", embed_id, file.display());
    }
    fallback
}

fn resolve_embed_strict(
    package_root: &Path,
    part: &Path,
    rels_path: &Path,
    embed_id: &str,
) -> Result<Option<PathBuf>> {
    if !rels_path.exists() {
        return Ok(None);
    }

    let resolved = read_relationships(rels_path)?
        .into_iter()
        .find(|rel| rel.id == embed_id && !rel.external && !rel.target.is_empty())
        .and_then(|rel| resolve_target(package_root, part, &rel.target))
        .filter(|path| path.is_file());

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DRAWING_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image2.png"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/missing.png"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
</Relationships>"#;

    fn package_with_media() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("xl/media");
        fs::create_dir_all(&media).unwrap();
        fs::create_dir_all(dir.path().join("xl/drawings/_rels")).unwrap();
        fs::write(media.join("image1.png"), b"one").unwrap();
        fs::write(media.join("image2.png"), b"two").unwrap();
        fs::write(
            dir.path().join("xl/drawings/_rels/drawing1.xml.rels"),
            DRAWING_RELS,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(DRAWING_RELS).unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[0].target, "../media/image2.png");
        assert!(rels[0].rel_type.ends_with("/image"));
        assert!(!rels[0].external);
        assert!(rels[2].external);
    }

    #[test]
    fn test_resolve_embed_through_relationships() {
        let dir = package_with_media();
        let root = dir.path();
        let media = MediaLibrary::open(root).unwrap();
        let part = root.join("xl/drawings/drawing1.xml");
        let rels = root.join("xl/drawings/_rels/drawing1.xml.rels");

        assert_eq!(
            resolve_embed(root, &part, &rels, "rId1", &media),
            Some(root.join("xl/media/image2.png"))
        );
    }

    #[test]
    fn test_resolve_embed_falls_back_to_first_media_file() {
        let dir = package_with_media();
        let root = dir.path();
        let media = MediaLibrary::open(root).unwrap();
        let part = root.join("xl/drawings/drawing1.xml");
        let rels = root.join("xl/drawings/_rels/drawing1.xml.rels");
        let first = Some(root.join("xl/media/image1.png"));

        // Target does not exist
        assert_eq!(resolve_embed(root, &part, &rels, "rId2", &media), first);
        // External relationship
        assert_eq!(resolve_embed(root, &part, &rels, "rId3", &media), first);
        // Unknown id
        assert_eq!(resolve_embed(root, &part, &rels, "rId99", &media), first);
        // Missing relationship file
        let missing = root.join("xl/drawings/_rels/drawing9.xml.rels");
        assert_eq!(resolve_embed(root, &part, &missing, "rId1", &media), first);

        // Unparsable relationship file
        fs::write(&rels, "<Relationships><Relationship></Relationships>").unwrap();
        assert_eq!(resolve_embed(root, &part, &rels, "rId1", &media), first);
    }
}
