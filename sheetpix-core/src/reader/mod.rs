//! Readers for the parts of an unpacked spreadsheet package

pub mod drawing;
pub mod headers;
pub mod manifest;
pub mod parser_utils;
pub mod relationships;

pub use drawing::{DrawingPart, ImageAnchor, locate_drawing, read_anchors};
pub use headers::{HeaderReader, column_name_at, placeholder_name};
pub use manifest::Manifest;
pub use relationships::{Relationship, resolve_embed};
