//! Per-page viewport: document units to screen pixels
//!
//! Document coordinates originate bottom-left; screen coordinates originate
//! top-left. The flip lives in exactly one place, the `doc_to_screen`
//! matrix, so no other code performs axis inversion.

use crate::matrix::Affine;

/// Render scale applied when decoding a page. 1.5 keeps text crisp without
/// ballooning the raster.
pub const DEFAULT_RENDER_SCALE: f64 = 1.5;

/// Screen-space window for one decoded page. Immutable for the page's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Canvas width in pixels.
    pub width_px: f64,
    /// Canvas height in pixels.
    pub height_px: f64,
    /// Render scale from document units to pixels.
    pub scale: f64,
    /// Document-space to screen-space transform (carries the Y flip).
    pub doc_to_screen: Affine,
}

impl Viewport {
    /// Build the viewport for a page of `page_width` × `page_height` document
    /// units rendered at `scale` pixels per unit.
    ///
    /// Callers validate the page geometry first; a decoder that produces
    /// non-finite or non-positive dimensions must reject the page before
    /// constructing a viewport.
    pub fn for_page(page_width: f64, page_height: f64, scale: f64) -> Self {
        Self {
            width_px: page_width * scale,
            height_px: page_height * scale,
            scale,
            doc_to_screen: Affine::new(scale, 0.0, 0.0, -scale, 0.0, page_height * scale),
        }
    }

    /// Inverse mapping, for editing surfaces that translate pointer positions
    /// back into document space.
    pub fn screen_to_doc(&self) -> Option<Affine> {
        self.doc_to_screen.invert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_origin_maps_to_bottom_left() {
        let vp = Viewport::for_page(612.0, 792.0, 1.0);
        // Document (0, 0) is the bottom-left corner: screen (0, height).
        assert_eq!(vp.doc_to_screen.apply(0.0, 0.0), (0.0, 792.0));
        // Document top-left (0, 792) is screen origin.
        assert_eq!(vp.doc_to_screen.apply(0.0, 792.0), (0.0, 0.0));
    }

    #[test]
    fn test_scale_applies_to_both_axes() {
        let vp = Viewport::for_page(612.0, 792.0, 1.5);
        assert_eq!(vp.width_px, 918.0);
        assert_eq!(vp.height_px, 1188.0);
        let (x, y) = vp.doc_to_screen.apply(100.0, 692.0);
        assert!((x - 150.0).abs() < 1e-9);
        assert!((y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_moving_up_in_document_moves_down_on_screen() {
        let vp = Viewport::for_page(600.0, 800.0, 1.0);
        let (_, low) = vp.doc_to_screen.apply(0.0, 100.0);
        let (_, high) = vp.doc_to_screen.apply(0.0, 200.0);
        assert!(high < low);
    }
}
