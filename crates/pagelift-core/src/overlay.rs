//! Overlay builder: decoded page to editable scene
//!
//! Layers the background raster under one occlusion-patch + editable-text
//! pair per non-blank run. The patch hides the original glyphs; the text
//! element sits at the same origin so the page looks unchanged until the
//! user starts editing.

use crate::color::Color;
use crate::image::PageImage;
use crate::run::{transform_runs, TextRun};
use crate::scene::{
    BackgroundImage, EditableText, OcclusionPatch, SceneModel, ScreenRect, VisualElement,
};
use crate::viewport::Viewport;

/// Patches overestimate the glyph box height so descenders cannot bleed
/// through at the bottom edge.
pub const PATCH_HEIGHT_FACTOR: f64 = 1.2;

/// Overlay construction knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Fill for occlusion patches; matches the page background tone.
    pub patch_fill: Color,
    /// Typeface for editable text. Document fonts are not reproduced; a
    /// fixed safe fallback is used instead.
    pub fallback_font: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            patch_fill: Color::WHITE,
            fallback_font: "Helvetica".to_string(),
        }
    }
}

/// Build the editable scene for one decoded page.
///
/// The background is inserted first and stretched to exactly fill the
/// viewport, so overlay coordinates (computed in viewport space) align with
/// it regardless of the decoder's native raster resolution. Then, per run in
/// original order: patch, then text. Inputs are not mutated; building twice
/// from the same decoded page yields equal scenes.
pub fn build_scene(
    background: PageImage,
    runs: &[TextRun],
    viewport: Viewport,
    config: &OverlayConfig,
) -> SceneModel {
    let mut scene = SceneModel::new(viewport);

    scene.add(VisualElement::Background(BackgroundImage {
        rect: ScreenRect::new(0.0, 0.0, viewport.width_px, viewport.height_px),
        image: background,
    }));

    for run in transform_runs(runs, &viewport) {
        scene.add(VisualElement::Patch(OcclusionPatch {
            rect: ScreenRect::new(
                run.screen_x,
                run.screen_y,
                run.width_px,
                run.font_size_px * PATCH_HEIGHT_FACTOR,
            ),
            fill: config.patch_fill,
        }));
        scene.add(VisualElement::Text(EditableText {
            rect: ScreenRect::new(run.screen_x, run.screen_y, run.width_px, run.font_size_px),
            content: run.content,
            font_size_px: run.font_size_px,
            font_family: config.fallback_font.clone(),
            fill: Color::BLACK,
        }));
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Affine;
    use pretty_assertions::assert_eq;

    fn viewport() -> Viewport {
        Viewport::for_page(400.0, 800.0 / 1.5, 1.5)
    }

    fn background() -> PageImage {
        PageImage::filled(40, 53, Color::WHITE)
    }

    fn run(content: &str, x: f64, y: f64) -> TextRun {
        TextRun::new(
            content,
            Affine::translate(x, y).multiply(Affine::scale(12.0, 12.0)),
            40.0,
        )
    }

    #[test]
    fn test_background_is_first_and_fills_viewport() {
        let scene = build_scene(background(), &[], viewport(), &OverlayConfig::default());
        assert_eq!(scene.len(), 1);
        match &scene.elements()[0].element {
            VisualElement::Background(b) => {
                assert_eq!((b.rect.x, b.rect.y), (0.0, 0.0));
                assert!((b.rect.width - 600.0).abs() < 1e-9);
                assert!((b.rect.height - 800.0).abs() < 1e-9);
                // Native raster resolution differs from the viewport; the
                // rect, not the image, defines its painted size.
                assert_eq!(b.image.width(), 40);
            }
            other => panic!("expected background first, got {:?}", other),
        }
    }

    #[test]
    fn test_each_run_emits_patch_then_text() {
        let runs = vec![run("Hello", 50.0, 700.0)];
        let scene = build_scene(background(), &runs, viewport(), &OverlayConfig::default());
        assert_eq!(scene.len(), 3);

        let patch = match &scene.elements()[1].element {
            VisualElement::Patch(p) => p,
            other => panic!("expected patch, got {:?}", other),
        };
        let text = match &scene.elements()[2].element {
            VisualElement::Text(t) => t,
            other => panic!("expected text, got {:?}", other),
        };

        // Occlusion law: same origin, patch at least as wide, 1.2x as tall.
        assert_eq!((patch.rect.x, patch.rect.y), (text.rect.x, text.rect.y));
        assert!(patch.rect.width >= text.rect.width);
        assert!((patch.rect.height - text.font_size_px * PATCH_HEIGHT_FACTOR).abs() < 1e-9);
        assert_eq!(patch.fill, Color::WHITE);
        assert_eq!(text.font_family, "Helvetica");
        assert_eq!(text.content, "Hello");
    }

    #[test]
    fn test_whitespace_only_run_yields_no_elements() {
        let runs = vec![run("   ", 50.0, 700.0)];
        let scene = build_scene(background(), &runs, viewport(), &OverlayConfig::default());
        assert_eq!(scene.len(), 1); // background only
    }

    #[test]
    fn test_run_order_is_paint_order() {
        let runs = vec![run("first", 10.0, 700.0), run("second", 10.0, 650.0)];
        let scene = build_scene(background(), &runs, viewport(), &OverlayConfig::default());
        let texts: Vec<&str> = scene
            .elements()
            .iter()
            .filter_map(|e| match &e.element {
                VisualElement::Text(t) => Some(t.content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_build_is_idempotent_for_same_input() {
        let runs = vec![run("Hello", 50.0, 700.0), run("  ", 10.0, 650.0)];
        let a = build_scene(background(), &runs, viewport(), &OverlayConfig::default());
        let b = build_scene(background(), &runs, viewport(), &OverlayConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_patch_fill_is_configurable() {
        let config = OverlayConfig {
            patch_fill: Color::from_hex("#F0EAD6"),
            ..OverlayConfig::default()
        };
        let runs = vec![run("Hello", 50.0, 700.0)];
        let scene = build_scene(background(), &runs, viewport(), &config);
        match &scene.elements()[1].element {
            VisualElement::Patch(p) => assert_eq!(p.fill, Color::from_hex("#F0EAD6")),
            other => panic!("expected patch, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::matrix::Affine;
    use proptest::prelude::*;

    fn arb_runs() -> impl Strategy<Value = Vec<TextRun>> {
        prop::collection::vec(
            ("[a-zA-Z ]{0,12}", 1.0f64..60.0, 0.0f64..500.0, 0.0f64..600.0).prop_map(
                |(content, size, x, y)| {
                    TextRun::new(
                        content,
                        Affine::translate(x, y).multiply(Affine::scale(size, size)),
                        size * 3.0,
                    )
                },
            ),
            0..8,
        )
    }

    proptest! {
        /// Property: every text element is immediately preceded by exactly
        /// one patch at the same origin covering it
        #[test]
        fn occlusion_law(runs in arb_runs()) {
            let viewport = Viewport::for_page(612.0, 792.0, 1.5);
            let scene = build_scene(
                PageImage::filled(10, 10, Color::WHITE),
                &runs,
                viewport,
                &OverlayConfig::default(),
            );

            let elements = scene.elements();
            for (i, entry) in elements.iter().enumerate() {
                if let VisualElement::Text(text) = &entry.element {
                    prop_assert!(i >= 1, "text element cannot be first");
                    prop_assert!(
                        matches!(elements[i - 1].element, VisualElement::Patch(_)),
                        "text at index {} not preceded by a patch",
                        i
                    );
                    if let VisualElement::Patch(patch) = &elements[i - 1].element {
                        prop_assert_eq!(
                            (patch.rect.x, patch.rect.y),
                            (text.rect.x, text.rect.y)
                        );
                        prop_assert!(patch.rect.width >= text.rect.width);
                        prop_assert!(
                            patch.rect.height >= text.font_size_px * PATCH_HEIGHT_FACTOR - 1e-9
                        );
                    }
                }
            }

            // Pair count matches the non-blank run count.
            let pairs = elements
                .iter()
                .filter(|e| matches!(e.element, VisualElement::Text(_)))
                .count();
            let non_blank = runs.iter().filter(|r| !r.is_blank()).count();
            prop_assert_eq!(pairs, non_blank);
        }
    }
}
