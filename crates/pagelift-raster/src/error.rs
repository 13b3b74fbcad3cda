use thiserror::Error;

/// Export failures. Surfaced to the user; the editing state is preserved so
/// the operation can be retried.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to allocate a {width}x{height} raster surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to encode raster: {0}")]
    Encode(String),

    #[error("failed to assemble page container: {0}")]
    Container(String),
}
