//! API handlers for the pagelift server
//!
//! One substantive endpoint: upload a document, get back the first page's
//! text geometry as simple JSON for an overlay editor. Multi-page documents
//! are truncated to page one by the decoder; that limitation is part of the
//! endpoint's contract.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use tracing::{debug, info};

use pagelift_core::{transform_runs, Color};
use pagelift_decode::PageDecoder;

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pagelift-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One positioned text item, in screen pixels.
#[derive(Serialize)]
pub struct TextItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "fontSize")]
    pub font_size: f64,
    pub color: String,
}

/// Parse response: first-page geometry only.
#[derive(Serialize)]
pub struct ParseResponse {
    pub width: f64,
    pub height: f64,
    pub texts: Vec<TextItem>,
}

/// Handler: POST /api/parse-pdf
///
/// The request body is the raw document file. The response carries the
/// viewport size and every non-blank text run in screen-space coordinates
/// (top-left origin, baseline already corrected to glyph-box top).
pub async fn handle_parse_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ParseResponse>, ServerError> {
    if body.is_empty() {
        return Err(ServerError::NoFile);
    }
    info!(size = body.len(), "parse request");

    let decoder = state.decoder.clone();
    let page = tokio::task::spawn_blocking(move || decoder.decode_page(&body))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    let texts: Vec<TextItem> = transform_runs(&page.runs, &page.viewport)
        .into_iter()
        .map(|run| TextItem {
            text: run.content,
            x: run.screen_x,
            y: run.screen_y,
            font_size: run.font_size_px,
            color: Color::BLACK.to_hex(),
        })
        .collect();

    debug!(texts = texts.len(), "parse complete");

    Ok(Json(ParseResponse {
        width: page.viewport.width_px,
        height: page.viewport.height_px,
        texts,
    }))
}
