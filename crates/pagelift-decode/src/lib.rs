//! Page decoder collaborator
//!
//! The pipeline treats page decoding as a black box: raw bytes in, page
//! geometry plus an ordered sequence of text runs out. This crate defines
//! that contract (`PageDecoder`) and ships a `lopdf`-backed implementation
//! good enough to drive the overlay pipeline. Glyph decoding and
//! font-program interpretation stay behind the boundary.

pub mod error;

mod decoder;
mod extract;
mod raster;

pub use decoder::LopdfDecoder;
pub use error::DecodeError;

use pagelift_core::{PageImage, TextRun, Viewport};

/// Everything the pipeline needs from one decoded page.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPage {
    pub viewport: Viewport,
    /// Rasterized page background at viewport resolution.
    pub background: PageImage,
    /// Text runs in content order. May include blank runs; the overlay
    /// builder filters those.
    pub runs: Vec<TextRun>,
}

/// Collaborator contract: decode the first page of a document.
///
/// Implementations decode only the first page; documents with more pages
/// are truncated to page one.
pub trait PageDecoder: Send + Sync {
    fn decode_page(&self, bytes: &[u8]) -> Result<DecodedPage, DecodeError>;
}
