//! Glyph runs and the coordinate transform engine
//!
//! A decoded page reports each contiguous span of same-styled text as a run
//! with an affine transform anchored at the text baseline, in document space.
//! The transform engine maps a run into screen space: anchor position, font
//! size, and width, with the baseline converted to a top-left origin.

use tracing::warn;

use crate::error::TransformError;
use crate::matrix::Affine;
use crate::viewport::Viewport;

/// One glyph run as reported by the page decoder. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: String,
    /// Baseline-anchored transform in document space.
    pub transform: Affine,
    /// Advance width of the run in document units.
    pub width_units: f64,
}

impl TextRun {
    pub fn new(content: impl Into<String>, transform: Affine, width_units: f64) -> Self {
        Self {
            content: content.into(),
            transform,
            width_units,
        }
    }

    /// Whitespace-only runs are never rendered.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A run mapped into screen space. Derived on demand and folded straight into
/// scene construction; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedRun {
    pub content: String,
    /// Left edge of the glyph box, screen pixels.
    pub screen_x: f64,
    /// Top of the glyph box in screen pixels, never the baseline.
    pub screen_y: f64,
    pub font_size_px: f64,
    pub width_px: f64,
}

/// Map one run into screen space.
///
/// The composition `doc_to_screen ∘ run` yields the screen-space anchor in a
/// single step; the viewport matrix already carries the vertical-axis flip,
/// so no flip happens here or anywhere downstream. The font size is the norm
/// of the composed matrix's first column, which equals the run-matrix norm
/// times the render scale and is invariant under rotation.
pub fn transform_run(
    run: &TextRun,
    viewport: &Viewport,
) -> Result<TransformedRun, TransformError> {
    if !run.transform.is_finite() {
        return Err(TransformError::NonFiniteMatrix);
    }

    let composed = viewport.doc_to_screen.multiply(run.transform);
    let font_size_px = composed.x_scale();
    if !font_size_px.is_finite() || font_size_px <= 0.0 {
        return Err(TransformError::DegenerateMatrix);
    }

    // Baseline -> top-left: text renderers anchor at the glyph box top,
    // document renderers at the baseline.
    Ok(TransformedRun {
        content: run.content.clone(),
        screen_x: composed.tx(),
        screen_y: composed.ty() - font_size_px,
        font_size_px,
        width_px: run.width_units * viewport.scale,
    })
}

/// Map a page's runs into screen space in original order.
///
/// Blank runs are filtered out, never emitted. A run with a defective matrix
/// is skipped and logged; the rest of the page still renders.
pub fn transform_runs(runs: &[TextRun], viewport: &Viewport) -> Vec<TransformedRun> {
    runs.iter()
        .filter(|run| !run.is_blank())
        .filter_map(|run| match transform_run(run, viewport) {
            Ok(transformed) => Some(transformed),
            Err(err) => {
                warn!(
                    content = %run.content.chars().take(24).collect::<String>(),
                    %err,
                    "skipping glyph run with defective transform"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn viewport_600x800() -> Viewport {
        // 600×800 px at scale 1.5, i.e. a 400×533.33-unit page.
        Viewport::for_page(400.0, 800.0 / 1.5, 1.5)
    }

    #[test]
    fn test_round_trip_scenario() {
        let vp = viewport_600x800();
        assert!((vp.width_px - 600.0).abs() < 1e-9);
        assert!((vp.height_px - 800.0).abs() < 1e-9);

        let run = TextRun::new(
            "Hello",
            Affine::new(12.0, 0.0, 0.0, 12.0, 50.0, 700.0),
            40.0,
        );
        let t = transform_run(&run, &vp).expect("well-formed run");

        let composed = vp.doc_to_screen.multiply(run.transform);
        assert!((t.font_size_px - 18.0).abs() < 1e-9);
        assert!((t.screen_x - composed.tx()).abs() < 1e-9);
        assert!((t.screen_y - (composed.ty() - 18.0)).abs() < 1e-9);
        assert!((t.width_px - 60.0).abs() < 1e-9);
        assert_eq!(t.content, "Hello");
    }

    #[test]
    fn test_screen_y_is_glyph_box_top() {
        // An unrotated run at document y with font size s must sit at
        // (page_h - y) * scale - s*scale on screen.
        let vp = Viewport::for_page(612.0, 792.0, 2.0);
        let run = TextRun::new("x", Affine::new(10.0, 0.0, 0.0, 10.0, 0.0, 700.0), 5.0);
        let t = transform_run(&run, &vp).expect("well-formed run");
        let expected_baseline = (792.0 - 700.0) * 2.0;
        assert!((t.screen_y - (expected_baseline - 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_matrix_is_rejected() {
        let vp = viewport_600x800();
        let run = TextRun::new(
            "bad",
            Affine::new(f64::NAN, 0.0, 0.0, 12.0, 0.0, 0.0),
            1.0,
        );
        assert_eq!(
            transform_run(&run, &vp),
            Err(TransformError::NonFiniteMatrix)
        );
    }

    #[test]
    fn test_degenerate_matrix_is_rejected() {
        let vp = viewport_600x800();
        let run = TextRun::new("bad", Affine::new(0.0, 0.0, 0.0, 12.0, 0.0, 0.0), 1.0);
        assert_eq!(
            transform_run(&run, &vp),
            Err(TransformError::DegenerateMatrix)
        );
    }

    #[test]
    fn test_blank_runs_are_filtered() {
        let vp = viewport_600x800();
        let runs = vec![
            TextRun::new("   ", Affine::scale(12.0, 12.0), 10.0),
            TextRun::new("keep", Affine::scale(12.0, 12.0), 10.0),
            TextRun::new("", Affine::scale(12.0, 12.0), 10.0),
        ];
        let out = transform_runs(&runs, &vp);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "keep");
    }

    #[test]
    fn test_defective_run_is_skipped_not_fatal() {
        let vp = viewport_600x800();
        let runs = vec![
            TextRun::new("bad", Affine::new(f64::INFINITY, 0.0, 0.0, 1.0, 0.0, 0.0), 1.0),
            TextRun::new("good", Affine::scale(12.0, 12.0), 10.0),
        ];
        let out = transform_runs(&runs, &vp);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "good");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn font_size() -> impl Strategy<Value = f64> {
        1.0f64..72.0
    }

    proptest! {
        /// Property: the recovered font size is positive and invariant under
        /// composing a pure rotation into the run matrix
        #[test]
        fn font_size_positive_and_rotation_invariant(
            size in font_size(),
            angle in 0.0f64..std::f64::consts::TAU,
            tx in 0.0f64..500.0,
            ty in 0.0f64..700.0,
            scale in 0.5f64..3.0,
        ) {
            let vp = Viewport::for_page(612.0, 792.0, scale);
            let plain = TextRun::new(
                "a",
                Affine::translate(tx, ty).multiply(Affine::scale(size, size)),
                size,
            );
            let rotated = TextRun::new(
                "a",
                Affine::translate(tx, ty)
                    .multiply(Affine::rotate(angle))
                    .multiply(Affine::scale(size, size)),
                size,
            );

            let t0 = transform_run(&plain, &vp).expect("well-formed");
            let t1 = transform_run(&rotated, &vp).expect("well-formed");

            prop_assert!(t0.font_size_px > 0.0);
            prop_assert!((t0.font_size_px - size * scale).abs() < 1e-6);
            prop_assert!(
                (t0.font_size_px - t1.font_size_px).abs() < 1e-6,
                "rotation changed the font size: {} vs {}",
                t0.font_size_px,
                t1.font_size_px
            );
        }

        /// Property: blank content never survives the batch transform
        #[test]
        fn blank_runs_never_emitted(spaces in " {0,12}") {
            let vp = Viewport::for_page(612.0, 792.0, 1.5);
            let runs = vec![TextRun::new(spaces, Affine::scale(12.0, 12.0), 10.0)];
            prop_assert!(transform_runs(&runs, &vp).is_empty());
        }
    }
}
