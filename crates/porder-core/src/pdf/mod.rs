//! PDF processing module.

mod annotate;
mod engine;
mod extractor;
pub mod layout;
pub mod page;

pub use extractor::PdfExtractor;

use std::path::Path;

use crate::error::PdfError;
use crate::models::config::AnnotationStyle;
use crate::models::zone::CaptureZone;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
///
/// Full-text extraction and zone reading are separate capabilities: a
/// document whose text layer defeats one engine may still be readable by the
/// other. Pages are 1-indexed.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Text of every page in order, joined by newlines. Pages without text
    /// contribute nothing.
    fn extract_text(&self) -> Result<String>;

    /// Text of a single page.
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Trimmed text rendered inside the zone on a page.
    fn extract_region_text(&self, page: u32, zone: &CaptureZone) -> Result<String>;

    /// Outline the zone on a page.
    fn draw_rectangle(&mut self, page: u32, zone: &CaptureZone, style: &AnnotationStyle) -> Result<()>;

    /// Write the whole document, creating or overwriting the file.
    fn save(&mut self, path: &Path) -> Result<()>;
}

fn load_file(path: &Path) -> Result<PdfExtractor> {
    let data = std::fs::read(path)
        .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data)?;
    Ok(extractor)
}

/// Full text of the PDF at `path`.
pub fn extract_full_text(path: &Path) -> Result<String> {
    load_file(path)?.extract_text()
}

/// Text inside the zone on the first page of the PDF at `path`.
pub fn extract_text_in_region(path: &Path, zone: &CaptureZone) -> Result<String> {
    load_file(path)?.extract_region_text(1, zone)
}
