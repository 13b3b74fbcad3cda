use thiserror::Error;

/// Decode failures. Surfaced to the user; never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("failed to parse document: {0}")]
    Unreadable(String),

    #[error("document has no pages")]
    NoPages,

    #[error("page geometry is degenerate: {0}")]
    BadGeometry(String),
}
