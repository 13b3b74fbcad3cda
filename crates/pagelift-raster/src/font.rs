//! Fallback typeface for flattened text
//!
//! Document fonts are not reproduced; flattened text is drawn with one safe
//! fallback face discovered from well-known system locations. When no font
//! can be found the flattener degrades gracefully: geometry still paints,
//! glyphs are omitted.

use rusttype::{point, Font, Scale};
use tiny_skia::Pixmap;
use tracing::{debug, warn};

use pagelift_core::Color;

const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct FallbackFont {
    font: Option<Font<'static>>,
}

impl FallbackFont {
    /// Probe the system font locations. Never fails; a machine without any
    /// known font yields a glyphless fallback.
    pub fn discover() -> Self {
        for path in FONT_PATHS {
            if let Ok(data) = std::fs::read(path) {
                if let Some(font) = Font::try_from_vec(data) {
                    debug!(path, "loaded fallback font");
                    return Self { font: Some(font) };
                }
            }
        }
        warn!("no system font found; flattened text will have no glyphs");
        Self { font: None }
    }

    /// Use explicit font bytes (embedded asset, test fixture).
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Self { font: Some(font) })
    }

    pub fn glyphless() -> Self {
        Self { font: None }
    }

    pub fn has_glyphs(&self) -> bool {
        self.font.is_some()
    }

    /// Draw a line of text whose glyph-box top sits at `top_y`.
    pub fn draw(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f64,
        top_y: f64,
        size_px: f64,
        fill: Color,
    ) {
        let Some(font) = &self.font else { return };

        let scale = Scale::uniform(size_px as f32);
        let v_metrics = font.v_metrics(scale);
        let origin = point(x as f32, top_y as f32 + v_metrics.ascent);

        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;

        for glyph in font.layout(text, scale, origin) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let px = bb.min.x + gx as i32;
                    let py = bb.min.y + gy as i32;
                    if px < 0 || py < 0 || px >= width || py >= height {
                        return;
                    }
                    blend_pixel(pixmap, px as u32, py as u32, fill, coverage);
                });
            }
        }
    }
}

/// Source-over blend of an opaque color at `coverage` onto one pixel.
fn blend_pixel(pixmap: &mut Pixmap, x: u32, y: u32, fill: Color, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    if coverage <= 0.0 {
        return;
    }
    let width = pixmap.width() as usize;
    let idx = y as usize * width + x as usize;
    let pixels = pixmap.pixels_mut();
    let dst = pixels[idx].demultiply();
    let inv = 1.0 - coverage;

    let r = fill.r as f32 * coverage + dst.red() as f32 * inv;
    let g = fill.g as f32 * coverage + dst.green() as f32 * inv;
    let b = fill.b as f32 * coverage + dst.blue() as f32 * inv;
    let a = 255.0 * coverage + dst.alpha() as f32 * inv;

    pixels[idx] = tiny_skia::ColorU8::from_rgba(r as u8, g as u8, b as u8, a as u8).premultiply();
}
