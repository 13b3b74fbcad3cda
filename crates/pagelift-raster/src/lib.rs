//! Flattening and export
//!
//! Rasterizes the scene model back into a single image and wraps that image
//! as a one-page document. This is the lossy, one-way end of the pipeline:
//! the editable overlay becomes pixels.

pub mod error;
pub mod flatten;
pub mod font;
pub mod wrap;

pub use error::ExportError;
pub use flatten::Flattener;
pub use font::FallbackFont;
pub use wrap::{encode_png, wrap_page, ExportedPage, Orientation};
