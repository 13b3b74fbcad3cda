//! Error types for the pagelift server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use pagelift_decode::DecodeError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Failed to decode document: {0}")]
    Decode(#[from] DecodeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::NoFile => (
                StatusCode::BAD_REQUEST,
                "NO_FILE",
                "No file uploaded".to_string(),
            ),
            ServerError::Decode(err) => (
                StatusCode::BAD_REQUEST,
                "DECODE_ERROR",
                format!("Error parsing document: {}", err),
            ),
            ServerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
