//! Editable overlay model for flattened document pages
//!
//! This crate holds the pure core of the pipeline: the affine geometry that
//! maps decoded glyph runs into screen space, and the scene model that an
//! editing surface mutates before export.
//!
//! Nothing here does I/O. Decoding lives in `pagelift-decode`, rasterization
//! in `pagelift-raster`, orchestration in `pagelift-session`.

pub mod color;
pub mod error;
pub mod image;
pub mod matrix;
pub mod overlay;
pub mod run;
pub mod scene;
pub mod viewport;

pub use color::Color;
pub use error::TransformError;
pub use image::PageImage;
pub use matrix::Affine;
pub use overlay::{build_scene, OverlayConfig, PATCH_HEIGHT_FACTOR};
pub use run::{transform_run, transform_runs, TextRun, TransformedRun};
pub use scene::{
    BackgroundImage, EditableText, ElementId, OcclusionPatch, SceneElement, SceneModel,
    ScenePatch, ScreenRect, VisualElement,
};
pub use viewport::{Viewport, DEFAULT_RENDER_SCALE};
