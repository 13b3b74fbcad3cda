use thiserror::Error;

/// Failures while mapping a single glyph run into screen space.
///
/// These indicate defective decoder output. They are fatal to the offending
/// run only: the batch transformer skips the run and the page still renders.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("run transform contains non-finite entries")]
    NonFiniteMatrix,

    #[error("run transform is degenerate (zero-length x basis)")]
    DegenerateMatrix,
}
