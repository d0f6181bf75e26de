//! pdf-extract text engine.
//!
//! pdf-extract brings its own lopdf release, so the engine parses its own
//! copy of the document from the (already decrypted) bytes. The copy is
//! prepared once at load time: image streams are emptied, CID width ranges
//! are clamped, the `'` and `"` operators are rewritten into their `T*`/`Tj`
//! equivalents and pages without a MediaBox get US Letter. Every call into
//! pdf-extract is guarded, so a panic inside it becomes an error.

use std::panic::{self, AssertUnwindSafe};

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Document, Object, ObjectId, OutputError, PlainTextOutput};
use tracing::{debug, trace};

use super::layout::{Glyph, GlyphCollector};
use super::page::PageBox;
use super::Result;
use crate::error::PdfError;

/// Highest CID a `W` width range may reach.
const MAX_CID: i64 = 0xFFFF;

/// Nested page-tree levels followed when looking for an inherited MediaBox.
const MAX_TREE_DEPTH: usize = 64;

/// Text and glyph extraction over one document.
pub struct TextEngine {
    doc: Document,
}

impl TextEngine {
    /// Parse and prepare the document.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let images = blank_images(&mut doc);
        let ranges = clamp_width_ranges(&mut doc);
        let rewritten = expand_quote_operators(&mut doc);
        let boxed = default_media_boxes(&mut doc);
        debug!(
            "Text engine ready: {} images blanked, {} width ranges clamped, {} streams rewritten, {} pages given a MediaBox",
            images, ranges, rewritten, boxed
        );

        Ok(Self { doc })
    }

    /// Plain text of one page, as laid out by pdf-extract.
    pub fn page_text(&self, page: u32) -> Result<String> {
        let mut text = String::new();
        guarded(|| {
            let mut output = PlainTextOutput::new(&mut text);
            pdf_extract::output_doc_page(&self.doc, &mut output, page)
        })?;
        Ok(text)
    }

    /// Every glyph shown on one page, placed relative to `page_box`.
    pub fn page_glyphs(&self, page: u32, page_box: PageBox) -> Result<Vec<Glyph>> {
        let mut collector = GlyphCollector::new(page_box);
        guarded(|| pdf_extract::output_doc_page(&self.doc, &mut collector, page))?;

        let glyphs = collector.into_glyphs();
        trace!("Placed {} glyphs on page {}", glyphs.len(), page);
        Ok(glyphs)
    }
}

fn guarded<T>(run: impl FnOnce() -> std::result::Result<T, OutputError>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
        Err(_) => Err(PdfError::TextExtraction(
            "text engine panicked on this document".to_string(),
        )),
    }
}

fn stream_subtype_is(obj: &Object, subtype: &[u8]) -> bool {
    match obj {
        Object::Stream(stream) => stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .is_ok_and(|name| name == subtype),
        _ => false,
    }
}

/// Empty every image XObject. pdf-extract runs `Do` targets as content
/// streams whatever their subtype.
fn blank_images(doc: &mut Document) -> usize {
    let mut blanked = 0;
    for obj in doc.objects.values_mut() {
        if stream_subtype_is(obj, b"Image") {
            if let Object::Stream(stream) = obj {
                stream.set_plain_content(Vec::new());
                blanked += 1;
            }
        }
    }
    blanked
}

/// Clamp every `first last width` range of the `W` arrays to `0..=MAX_CID`.
fn clamp_width_ranges(doc: &mut Document) -> usize {
    let mut referenced = Vec::new();
    let mut clamped = 0;
    for obj in doc.objects.values_mut() {
        clamped += clamp_nested(obj, &mut referenced);
    }
    for id in referenced {
        if let Ok(Object::Array(items)) = doc.get_object_mut(id) {
            clamped += clamp_ranges(items);
        }
    }
    clamped
}

fn clamp_nested(obj: &mut Object, referenced: &mut Vec<ObjectId>) -> usize {
    match obj {
        Object::Dictionary(dict) => {
            let mut clamped = 0;
            for (key, value) in dict.iter_mut() {
                if key.as_slice() == b"W" {
                    match value {
                        Object::Array(items) => clamped += clamp_ranges(items),
                        Object::Reference(id) => referenced.push(*id),
                        _ => {}
                    }
                } else {
                    clamped += clamp_nested(value, referenced);
                }
            }
            clamped
        }
        Object::Array(items) => items
            .iter_mut()
            .map(|item| clamp_nested(item, referenced))
            .sum(),
        _ => 0,
    }
}

fn clamp_ranges(items: &mut [Object]) -> usize {
    let mut clamped = 0;
    let mut i = 0;
    while i + 1 < items.len() {
        // `cid [w1 w2 ...]` is bounded by the array itself.
        if matches!(items[i + 1], Object::Array(_)) {
            i += 2;
            continue;
        }
        if i + 2 >= items.len() {
            break;
        }
        if let (Ok(first), Ok(last)) = (items[i].as_i64(), items[i + 1].as_i64()) {
            let low = first.clamp(0, MAX_CID);
            let high = last.clamp(low, MAX_CID);
            if (low, high) != (first, last) {
                items[i] = Object::Integer(low);
                items[i + 1] = Object::Integer(high);
                clamped += 1;
            }
        }
        i += 3;
    }
    clamped
}

/// Rewrite `'` and `"` into `T*` and `Tj`, which pdf-extract understands.
fn expand_quote_operators(doc: &mut Document) -> usize {
    let mut ids: Vec<ObjectId> = doc
        .get_pages()
        .into_values()
        .flat_map(|page_id| doc.get_page_contents(page_id))
        .collect();
    ids.extend(
        doc.objects
            .iter()
            .filter(|(_, obj)| stream_subtype_is(obj, b"Form"))
            .map(|(id, _)| *id),
    );

    let mut rewritten = 0;
    for id in ids {
        let Ok(Object::Stream(stream)) = doc.get_object_mut(id) else {
            continue;
        };
        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        if !data.iter().any(|b| matches!(b, b'\'' | b'"')) {
            continue;
        }
        let Ok(content) = Content::decode(&data) else {
            continue;
        };
        if !content
            .operations
            .iter()
            .any(|op| matches!(op.operator.as_str(), "'" | "\""))
        {
            continue;
        }

        let operations: Vec<Operation> = content.operations.into_iter().flat_map(expand_quote).collect();
        match (Content { operations }).encode() {
            Ok(encoded) => {
                stream.set_plain_content(encoded);
                rewritten += 1;
            }
            Err(e) => debug!("Could not re-encode content stream {:?}: {}", id, e),
        }
    }
    rewritten
}

fn expand_quote(op: Operation) -> Vec<Operation> {
    let Operation { operator, mut operands } = op;
    match operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), Operation::new("Tj", operands)],
        "\"" if operands.len() == 3 => {
            let text = operands.split_off(2);
            let char_spacing = operands.split_off(1);
            vec![
                Operation::new("Tw", operands),
                Operation::new("Tc", char_spacing),
                Operation::new("T*", vec![]),
                Operation::new("Tj", text),
            ]
        }
        _ => vec![Operation::new(&operator, operands)],
    }
}

fn has_media_box(doc: &Document, page_id: ObjectId) -> bool {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let Ok(dict) = doc.get_dictionary(node) else {
            return false;
        };
        if dict.has(b"MediaBox") {
            return true;
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = parent,
            Err(_) => return false,
        }
    }
    false
}

fn default_media_boxes(doc: &mut Document) -> usize {
    let missing: Vec<ObjectId> = doc
        .get_pages()
        .into_values()
        .filter(|&page_id| !has_media_box(doc, page_id))
        .collect();

    let letter = PageBox::LETTER;
    for &page_id in &missing {
        if let Ok(dict) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            let media_box: Vec<Object> = [letter.llx, letter.lly, letter.urx, letter.ury]
                .into_iter()
                .map(Object::from)
                .collect();
            dict.set("MediaBox", media_box);
        }
    }
    missing.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::zone::CaptureZone;
    use crate::pdf::layout::text_in_zone;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    const A4: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 595.0,
        ury: 842.0,
    };

    /// One-page A4 document with Helvetica as F1, saved to bytes. `extra`
    /// receives the document and the page resources before saving.
    fn one_page(
        content: &[u8],
        extra: impl FnOnce(&mut lopdf::Document, &mut lopdf::Dictionary),
    ) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        extra(&mut doc, &mut resources);

        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            lopdf::Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn zone_text(data: &[u8]) -> String {
        let engine = TextEngine::load(data).unwrap();
        let glyphs = engine.page_glyphs(1, A4).unwrap();
        text_in_zone(&glyphs, &CaptureZone::default())
    }

    #[test]
    fn test_standard_font_widths() {
        let data = one_page(b"BT /F1 10 Tf 360 700 Td (AB) Tj ET", |_, _| {});
        let engine = TextEngine::load(&data).unwrap();
        let glyphs = engine.page_glyphs(1, A4).unwrap();

        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].text, "A");
        assert_eq!((glyphs[0].x, glyphs[0].y), (360.0, 142.0));
        assert!((glyphs[0].size - 10.0).abs() < 1e-9);
        // Helvetica "A" is 667/1000 em wide.
        assert!((glyphs[0].width - 6.67).abs() < 1e-6);
        assert!((glyphs[1].x - 366.67).abs() < 1e-6);
    }

    #[test]
    fn test_words_placed_apart_keep_their_space() {
        // "Illinois" is 27.78 pt wide in Helvetica 10, so "Ltd" starts 2.78 pt after it.
        let data = one_page(
            b"BT /F1 10 Tf 360 687 Td (Illinois) Tj 30.56 0 Td (Ltd) Tj ET",
            |_, _| {},
        );
        assert_eq!(zone_text(&data), "Illinois Ltd");
    }

    #[test]
    fn test_tj_adjustment_and_leading() {
        let data = one_page(
            b"BT /F1 8 Tf 10 TL 360 690 Td [(ACME) -1000 (SARL)] TJ T* (Lyon) Tj ET",
            |_, _| {},
        );
        let engine = TextEngine::load(&data).unwrap();
        let glyphs = engine.page_glyphs(1, A4).unwrap();
        let zone = CaptureZone::new(350.0, 140.0, 240.0, 25.0).unwrap();
        assert_eq!(text_in_zone(&glyphs, &zone), "ACME SARL\nLyon");
    }

    #[test]
    fn test_cm_moves_glyphs() {
        let data = one_page(
            b"q 1 0 0 1 300 0 cm BT /F1 12 Tf 1 0 0 1 60 685 Tm (X) Tj ET Q \
              BT /F1 12 Tf 1 0 0 1 60 685 Tm (Y) Tj ET",
            |_, _| {},
        );
        let engine = TextEngine::load(&data).unwrap();
        let glyphs = engine.page_glyphs(1, A4).unwrap();

        assert_eq!(glyphs[0].text, "X");
        assert_eq!(glyphs[0].x, 360.0);
        assert_eq!(glyphs[1].text, "Y");
        assert_eq!(glyphs[1].x, 60.0);
        assert_eq!(text_in_zone(&glyphs, &CaptureZone::default()), "X");
    }

    #[test]
    fn test_quote_operator_shows_next_line() {
        let data = one_page(b"BT /F1 10 Tf 12 TL 72 760 Td (Header) Tj (ACME SARL) ' ET", |_, _| {});
        let engine = TextEngine::load(&data).unwrap();
        assert!(engine.page_text(1).unwrap().contains("ACME SARL"));

        let glyphs = engine.page_glyphs(1, A4).unwrap();
        let acme = glyphs.iter().find(|g| g.text == "C").unwrap();
        assert_eq!(acme.y, 94.0);
    }

    #[test]
    fn test_image_xobject_is_not_run_as_content() {
        let data = one_page(b"q 10 0 0 10 0 0 cm /Im1 Do Q BT /F1 10 Tf 360 687 Td (ACME) Tj ET", |doc, resources| {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 2,
                    "Height" => 2,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                b"(\x00\xff[<".to_vec(),
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        });
        assert_eq!(zone_text(&data), "ACME");
    }

    #[test]
    fn test_huge_width_range_is_clamped() {
        let mut cid_font_id: ObjectId = (0, 0);
        let data = one_page(b"BT /F1 10 Tf 360 687 Td (ACME) Tj ET", |doc, _| {
            cid_font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "CIDFontType2",
                "BaseFont" => "Damaged",
                "W" => vec![
                    lopdf::Object::Integer(0),
                    lopdf::Object::Integer(4_294_967_295),
                    lopdf::Object::Integer(500),
                    lopdf::Object::Integer(3),
                    lopdf::Object::Array(vec![lopdf::Object::Integer(600)]),
                ],
            });
        });

        let engine = TextEngine::load(&data).unwrap();
        let font = engine.doc.get_dictionary(cid_font_id).unwrap();
        let widths = font.get(b"W").unwrap().as_array().unwrap();
        let widths: Vec<i64> = widths[..3].iter().map(|o| o.as_i64().unwrap()).collect();
        assert_eq!(widths, vec![0, MAX_CID, 500]);
    }

    #[test]
    fn test_clamp_ranges_leaves_valid_arrays_alone() {
        let mut items = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(500)]),
            Object::Integer(-5),
            Object::Integer(70_000),
            Object::Integer(250),
            Object::Integer(10),
            Object::Integer(20),
            Object::Integer(300),
        ];
        assert_eq!(clamp_ranges(&mut items), 1);
        assert_eq!(items[2], Object::Integer(0));
        assert_eq!(items[3], Object::Integer(MAX_CID));
        assert_eq!(items[5], Object::Integer(10));
        assert_eq!(items[6], Object::Integer(20));
    }

    #[test]
    fn test_page_without_media_box_uses_letter() {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT /F1 10 Tf 72 700 Td (Letter) Tj ET".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        });
        doc.objects.insert(
            pages_id,
            lopdf::Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let engine = TextEngine::load(&data).unwrap();
        assert!(engine.page_text(1).unwrap().contains("Letter"));
    }

    #[test]
    fn test_engine_panic_becomes_error() {
        // F9 is not in the page resources.
        let data = one_page(b"BT /F9 10 Tf 72 700 Td (Boom) Tj ET", |_, _| {});
        let engine = TextEngine::load(&data).unwrap();
        assert!(matches!(engine.page_text(1), Err(PdfError::TextExtraction(_))));
        assert!(matches!(engine.page_glyphs(1, A4), Err(PdfError::TextExtraction(_))));
    }
}
