//! Positioned glyphs and the capture zone reader.
//!
//! pdf-extract interprets the content streams and reports every shown
//! character together with its text rendering matrix. [`GlyphCollector`]
//! turns those callbacks into glyphs placed in top-left page space.

use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

use super::page::PageBox;
use crate::models::zone::CaptureZone;

/// A glyph placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Decoded text, usually one character.
    pub text: String,
    /// Left of the glyph origin, top-left page space.
    pub x: f64,
    /// Baseline, top-left page space.
    pub y: f64,
    /// Advance width in points.
    pub width: f64,
    /// Effective font size in points.
    pub size: f64,
}

impl Glyph {
    /// Centre of the glyph box, assuming ascent 0.8 em and descent 0.2 em.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y - 0.3 * self.size)
    }
}

/// Output device collecting the glyphs of one page.
pub struct GlyphCollector {
    page_box: PageBox,
    glyphs: Vec<Glyph>,
}

impl GlyphCollector {
    pub fn new(page_box: PageBox) -> Self {
        Self {
            page_box,
            glyphs: Vec::new(),
        }
    }

    pub fn into_glyphs(self) -> Vec<Glyph> {
        self.glyphs
    }
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.glyphs.clear();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        if char.is_empty() {
            return Ok(());
        }

        // The rendering matrix excludes the font size: the glyph origin is
        // its translation, the advance and the em height are its scaled axes.
        let (x, y) = self.page_box.to_top_left(trm.m31, trm.m32);
        let advance = width * font_size;
        self.glyphs.push(Glyph {
            text: char.to_string(),
            x,
            y,
            width: (advance * trm.m11).hypot(advance * trm.m12),
            size: (font_size * trm.m21).hypot(font_size * trm.m22),
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Assemble the text of the glyphs whose centre lies inside the zone.
///
/// Glyphs keep content order. A baseline jump of more than half a glyph
/// height starts a new line; a horizontal gap wider than a fifth of an em
/// becomes a space.
pub fn text_in_zone(glyphs: &[Glyph], zone: &CaptureZone) -> String {
    let mut out = String::new();
    let mut last: Option<&Glyph> = None;

    for glyph in glyphs.iter().filter(|g| {
        let (cx, cy) = g.center();
        zone.contains(cx, cy)
    }) {
        if let Some(prev) = last {
            let line_height = prev.size.max(glyph.size);
            if (glyph.y - prev.y).abs() > line_height / 2.0 {
                out.push('\n');
            } else if glyph.x - (prev.x + prev.width) > glyph.size / 5.0 && !out.ends_with(' ') {
                out.push(' ');
            }
        }

        if glyph.text.trim().is_empty() {
            if !out.is_empty() && !out.ends_with([' ', '\n']) {
                out.push(' ');
            }
        } else {
            out.push_str(&glyph.text);
        }
        last = Some(glyph);
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
