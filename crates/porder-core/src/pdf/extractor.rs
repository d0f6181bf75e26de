//! PDF text extraction and annotation using lopdf and pdf-extract.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use lopdf::{Document, ObjectId};
use tracing::{debug, trace, warn};

use super::engine::TextEngine;
use super::{annotate, layout, page, PdfProcessor, Result};
use crate::error::PdfError;
use crate::models::config::AnnotationStyle;
use crate::models::zone::CaptureZone;

/// PDF processor backed by two engines: pdf-extract for text and glyph
/// positions, lopdf for page geometry, annotation and saving.
pub struct PdfExtractor {
    document: Option<Document>,
    engine: Option<TextEngine>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            engine: None,
        }
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn engine(&self) -> Result<&TextEngine> {
        self.engine
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let doc = self.document()?;
        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }
        doc.get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let decrypted = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // The text engine parses its own copy, so hand it decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            Some(decrypted_data)
        } else {
            None
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let engine = TextEngine::load(decrypted.as_deref().unwrap_or(data))?;

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        self.engine = Some(engine);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        let engine = self.engine()?;
        let total = self.page_count();

        let mut pages = Vec::new();
        let mut last_error = None;
        for page in 1..=total {
            match engine.page_text(page) {
                Ok(text) => pages.push(text.trim().to_string()),
                Err(e) => {
                    warn!("Skipping text of page {}: {}", page, e);
                    last_error = Some(e);
                }
            }
        }
        if pages.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let text = pages
            .into_iter()
            .filter(|page| !page.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        debug!("Extracted {} chars of text from {} pages", text.len(), total);
        Ok(text)
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        let text = self.engine()?.page_text(page)?;
        Ok(text.trim().to_string())
    }

    fn extract_region_text(&self, page: u32, zone: &CaptureZone) -> Result<String> {
        let page_id = self.page_id(page)?;
        let page_box = page::page_box(self.document()?, page_id);
        let glyphs = self.engine()?.page_glyphs(page, page_box)?;
        let text = layout::text_in_zone(&glyphs, zone);

        trace!("Zone {} on page {}: {:?}", zone, page, text);
        if text.is_empty() && !glyphs.is_empty() {
            debug!("No glyph of {} falls inside zone {}", glyphs.len(), zone);
        }
        Ok(text)
    }

    fn draw_rectangle(&mut self, page: u32, zone: &CaptureZone, style: &AnnotationStyle) -> Result<()> {
        let page_id = self.page_id(page)?;
        let doc = self
            .document
            .as_mut()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;
        annotate::draw_zone_outline(doc, page_id, zone, style)
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let doc = self
            .document
            .as_mut()
            .ok_or(PdfError::Parse("No document loaded".to_string()))?;

        let file = File::create(path)
            .map_err(|e| PdfError::Write(format!("{}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);
        doc.save_to(&mut writer).map_err(|e| {
            warn!("Failed to write {}: {}", path.display(), e);
            PdfError::Write(e.to_string())
        })?;

        debug!("Saved PDF to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use lopdf::{dictionary, Object, Stream};
    use pretty_assertions::assert_eq;

    /// Build a PDF with one text line per page, Helvetica, A4.
    fn build_pdf(pages: &[&[u8]]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids = Vec::new();
        for content in pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
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

    /// RC4-encrypt every stream under the empty user password. Without a `U`
    /// entry lopdf derives the key without checking it; `check` sets one.
    fn encrypt_streams(data: &[u8], check: Option<Vec<u8>>) -> Vec<u8> {
        let mut doc = Document::load_mem(data).unwrap();
        let mut encrypt = dictionary! {
            "Filter" => "Standard",
            "V" => 2,
            "R" => 3,
            "Length" => 40,
            "O" => Object::string_literal(vec![0x42u8; 32]),
            "P" => -4,
            "CF" => dictionary! { "StdCF" => dictionary! { "CFM" => "V2" } },
        };
        if let Some(user) = check {
            encrypt.set("U", Object::string_literal(user));
        }
        let encrypt_id = doc.add_object(encrypt);
        doc.trailer.set("Encrypt", encrypt_id);
        doc.trailer.set(
            "ID",
            vec![
                Object::string_literal(vec![7u8; 16]),
                Object::string_literal(vec![7u8; 16]),
            ],
        );

        let key = lopdf::encryption::get_encryption_key(&doc, "", false).unwrap();
        let stream_ids: Vec<ObjectId> = doc
            .objects
            .iter()
            .filter(|(_, obj)| matches!(obj, Object::Stream(_)))
            .map(|(id, _)| *id)
            .collect();
        for id in stream_ids {
            // RC4 is symmetric, so decrypting the plain bytes encrypts them.
            let encrypted =
                lopdf::encryption::decrypt_object(&key, id, doc.get_object(id).unwrap(), false).unwrap();
            if let Ok(Object::Stream(stream)) = doc.get_object_mut(id) {
                stream.set_content(encrypted);
            }
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert!(extractor.engine.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_unloaded_extractor_errors() {
        let extractor = PdfExtractor::new();
        assert!(extractor.extract_text().is_err());
        assert!(extractor
            .extract_region_text(1, &CaptureZone::default())
            .is_err());
    }

    #[test]
    fn test_full_text_skips_empty_pages() {
        let data = build_pdf(&[
            b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET",
            b"",
            b"BT /F1 12 Tf 72 720 Td (World) Tj ET",
        ]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();
        assert_eq!(extractor.page_count(), 3);

        assert_eq!(extractor.extract_text().unwrap(), "Hello\nWorld");
        assert_eq!(extractor.extract_page_text(2).unwrap(), "");
        assert_eq!(extractor.extract_page_text(3).unwrap(), "World");
    }

    #[test]
    fn test_zero_page_document_has_no_pages() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(&data), Err(PdfError::NoPages)));
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_empty_password_document_is_decrypted() {
        let plain = build_pdf(&[b"BT /F1 10 Tf 360 687 Td (ACME SARL) Tj ET"]);
        let data = encrypt_streams(&plain, None);
        assert!(Document::load_mem(&data).unwrap().is_encrypted());

        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();
        assert_eq!(extractor.extract_text().unwrap(), "ACME SARL");
        assert_eq!(
            extractor.extract_region_text(1, &CaptureZone::default()).unwrap(),
            "ACME SARL"
        );
    }

    #[test]
    fn test_wrong_password_is_encrypted_error() {
        let plain = build_pdf(&[b"BT /F1 10 Tf 360 687 Td (ACME) Tj ET"]);
        let data = encrypt_streams(&plain, Some(vec![0u8; 32]));

        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(&data), Err(PdfError::Encrypted)));
    }

    #[test]
    fn test_region_text_first_page_only() {
        let data = build_pdf(&[
            b"BT /F1 10 Tf 360 687 Td (ACME SARL) Tj ET",
            b"BT /F1 10 Tf 360 687 Td (Other) Tj ET",
        ]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        let zone = CaptureZone::default();
        assert_eq!(extractor.extract_region_text(1, &zone).unwrap(), "ACME SARL");
        assert_eq!(extractor.extract_region_text(2, &zone).unwrap(), "Other");
        assert!(matches!(
            extractor.extract_region_text(3, &zone),
            Err(PdfError::InvalidPage(3))
        ));
    }

    #[test]
    fn test_draw_and_save_round_trip() {
        let data = build_pdf(&[b"BT /F1 10 Tf 360 687 Td (ACME) Tj ET", b"BT ET"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();
        extractor
            .draw_rectangle(1, &CaptureZone::default(), &AnnotationStyle::default())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("annotated.pdf");
        extractor.save(&out).unwrap();

        let saved = Document::load(&out).unwrap();
        assert_eq!(saved.get_pages().len(), 2);

        let first = saved.get_pages()[&1];
        let content = Content::decode(&saved.get_page_content(first).unwrap()).unwrap();
        let rects: Vec<_> = content.operations.iter().filter(|op| op.operator == "re").collect();
        assert_eq!(rects.len(), 1);

        let second = saved.get_pages()[&2];
        let content = Content::decode(&saved.get_page_content(second).unwrap()).unwrap();
        assert!(content.operations.iter().all(|op| op.operator != "re"));

        // The outline does not disturb the zone text.
        let mut reloaded = PdfExtractor::new();
        reloaded.load(&std::fs::read(&out).unwrap()).unwrap();
        assert_eq!(
            reloaded.extract_region_text(1, &CaptureZone::default()).unwrap(),
            "ACME"
        );
    }
}
