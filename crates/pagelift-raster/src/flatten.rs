//! Scene flattening
//!
//! Paints every visual element in z-order onto one pixmap. The surface is
//! sized to the scene's bounding box, never smaller than the viewport, so
//! elements dragged past the right or bottom edge stay visible in the
//! export. Elements dragged to negative coordinates clip at the canvas
//! origin, matching the fixed-origin editing canvas.

use tiny_skia::{IntSize, Paint, Pixmap, PixmapPaint, Rect, Transform};
use tracing::debug;

use pagelift_core::{
    BackgroundImage, Color, EditableText, OcclusionPatch, PageImage, SceneModel, VisualElement,
};

use crate::error::ExportError;
use crate::font::FallbackFont;

/// Paints scenes with one fallback typeface.
pub struct Flattener {
    font: FallbackFont,
}

impl Flattener {
    /// Flattener with a system-discovered fallback font.
    pub fn new() -> Self {
        Self {
            font: FallbackFont::discover(),
        }
    }

    pub fn with_font(font: FallbackFont) -> Self {
        Self { font }
    }

    /// Rasterize the scene in paint order.
    pub fn flatten(&self, scene: &SceneModel) -> Result<PageImage, ExportError> {
        let viewport = scene.viewport();
        let bbox = scene.bounding_box();
        let width = viewport.width_px.max(bbox.max_x()).ceil().max(1.0) as u32;
        let height = viewport.height_px.max(bbox.max_y()).ceil().max(1.0) as u32;

        let mut pixmap =
            Pixmap::new(width, height).ok_or(ExportError::Surface { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        for entry in scene.elements() {
            match &entry.element {
                VisualElement::Background(background) => {
                    self.paint_background(&mut pixmap, background)
                }
                VisualElement::Patch(patch) => paint_patch(&mut pixmap, patch),
                VisualElement::Text(text) => self.paint_text(&mut pixmap, text),
            }
        }

        debug!(width, height, elements = scene.len(), "flattened scene");
        Ok(image_from_pixmap(&pixmap))
    }

    fn paint_background(&self, pixmap: &mut Pixmap, background: &BackgroundImage) {
        let Some(src) = pixmap_from_image(&background.image) else {
            return;
        };
        // Stretch the native raster to the element box.
        let sx = background.rect.width / background.image.width() as f64;
        let sy = background.rect.height / background.image.height() as f64;
        let transform = Transform::from_row(
            sx as f32,
            0.0,
            0.0,
            sy as f32,
            background.rect.x as f32,
            background.rect.y as f32,
        );
        pixmap.draw_pixmap(0, 0, src.as_ref(), &PixmapPaint::default(), transform, None);
    }

    fn paint_text(&self, pixmap: &mut Pixmap, text: &EditableText) {
        self.font.draw(
            pixmap,
            &text.content,
            text.rect.x,
            text.rect.y,
            text.font_size_px,
            text.fill,
        );
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_patch(pixmap: &mut Pixmap, patch: &OcclusionPatch) {
    let Some(rect) = Rect::from_xywh(
        patch.rect.x as f32,
        patch.rect.y as f32,
        patch.rect.width.max(0.0) as f32,
        patch.rect.height.max(0.0) as f32,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(to_ts_color(patch.fill));
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn to_ts_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255)
}

fn pixmap_from_image(image: &PageImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut premultiplied = Vec::with_capacity(image.pixels().len());
    for rgba in image.pixels().chunks_exact(4) {
        let c = tiny_skia::ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
        premultiplied.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(premultiplied, size)
}

fn image_from_pixmap(pixmap: &Pixmap) -> PageImage {
    let mut rgba = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    PageImage::from_rgba(pixmap.width(), pixmap.height(), rgba)
        .unwrap_or_else(|| PageImage::filled(1, 1, Color::WHITE))
}
