//! Drawing the capture zone outline onto a page.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::Result;
use super::page::page_box;
use crate::error::PdfError;
use crate::models::config::AnnotationStyle;
use crate::models::zone::CaptureZone;

/// Stroke the zone's outline on a page.
///
/// The existing content is wrapped in `q`/`Q` so whatever state it leaves
/// behind cannot shift or recolour the rectangle.
pub fn draw_zone_outline(
    doc: &mut Document,
    page_id: ObjectId,
    zone: &CaptureZone,
    style: &AnnotationStyle,
) -> Result<()> {
    let page_box = page_box(doc, page_id);
    // The zone's bottom-left corner in user space.
    let (x, y) = page_box.to_user_space(zone.x0, zone.y1());
    let [r, g, b] = style.color;

    let outline = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("w", vec![style.line_width.into()]),
            Operation::new(
                "re",
                vec![
                    (x as f32).into(),
                    (y as f32).into(),
                    (zone.width as f32).into(),
                    (zone.height as f32).into(),
                ],
            ),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let save = Content {
        operations: vec![Operation::new("q", vec![])],
    };

    let encode = |content: Content| {
        content
            .encode()
            .map_err(|e| PdfError::Write(format!("failed to encode content: {}", e)))
    };
    // Streams are concatenated when read back; keep a separator on both seams.
    let mut prefix = encode(save)?;
    prefix.push(b'\n');
    let mut suffix = b"\n".to_vec();
    suffix.extend(encode(outline)?);
    let prefix_id = doc.add_object(Stream::new(dictionary! {}, prefix));
    let suffix_id = doc.add_object(Stream::new(dictionary! {}, suffix));

    let existing = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfError::Parse(e.to_string()))?
        .get(b"Contents")
        .ok()
        .cloned();

    let mut contents = vec![Object::Reference(prefix_id)];
    match existing {
        Some(Object::Array(streams)) => contents.extend(streams),
        Some(reference @ Object::Reference(_)) => contents.push(reference),
        Some(Object::Stream(stream)) => contents.push(Object::Reference(doc.add_object(stream))),
        _ => {}
    }
    contents.push(Object::Reference(suffix_id));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfError::Parse(e.to_string()))?
        .set("Contents", Object::Array(contents));

    debug!(
        "Outlined zone {} at user-space ({:.1}, {:.1}) on page {:?}",
        zone, x, y, page_id
    );
    Ok(())
}
