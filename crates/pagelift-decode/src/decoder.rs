//! lopdf-backed `PageDecoder`

use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info};

use pagelift_core::{Viewport, DEFAULT_RENDER_SCALE};

use crate::error::DecodeError;
use crate::extract::{extract_runs, inherited};
use crate::raster::render_background;
use crate::{DecodedPage, PageDecoder};

/// Decodes the first page of a PDF with `lopdf`.
#[derive(Debug, Clone)]
pub struct LopdfDecoder {
    render_scale: f64,
}

impl LopdfDecoder {
    pub fn new(render_scale: f64) -> Self {
        Self { render_scale }
    }
}

impl Default for LopdfDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_SCALE)
    }
}

impl PageDecoder for LopdfDecoder {
    fn decode_page(&self, bytes: &[u8]) -> Result<DecodedPage, DecodeError> {
        if !self.render_scale.is_finite() || self.render_scale <= 0.0 {
            return Err(DecodeError::BadGeometry(format!(
                "render scale {} is not usable",
                self.render_scale
            )));
        }

        let doc =
            Document::load_mem(bytes).map_err(|e| DecodeError::Unreadable(e.to_string()))?;

        let pages = doc.get_pages();
        let Some((_, &page_id)) = pages.iter().next() else {
            return Err(DecodeError::NoPages);
        };
        if pages.len() > 1 {
            debug!(
                pages = pages.len(),
                "multi-page document: pages beyond the first are ignored"
            );
        }

        let (page_width, page_height) = page_size(&doc, page_id)?;
        let viewport = Viewport::for_page(page_width, page_height, self.render_scale);

        let runs = extract_runs(&doc, page_id);
        let background = render_background(&doc, page_id, &viewport);

        info!(
            runs = runs.len(),
            width_px = viewport.width_px,
            height_px = viewport.height_px,
            "decoded page"
        );

        Ok(DecodedPage {
            viewport,
            background,
            runs,
        })
    }
}

/// Page dimensions in document units from the (possibly inherited) MediaBox.
fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), DecodeError> {
    let media_box = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| {
            let mut out = [0.0f64; 4];
            for (slot, obj) in out.iter_mut().zip(arr.iter()) {
                *slot = match obj {
                    Object::Integer(i) => *i as f64,
                    Object::Real(r) => *r as f64,
                    _ => 0.0,
                };
            }
            out
        })
        // US Letter, the conventional fallback for boxless pages.
        .unwrap_or([0.0, 0.0, 612.0, 792.0]);

    let width = (media_box[2] - media_box[0]).abs();
    let height = (media_box[3] - media_box[1]).abs();

    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(DecodeError::BadGeometry(format!(
            "MediaBox resolves to {width}x{height}"
        )));
    }
    Ok((width, height))
}
