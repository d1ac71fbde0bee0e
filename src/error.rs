//! Library error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised by the analysis library.
///
/// Degenerate statistics (empty or single-element groups) are not errors:
/// they surface as NaN values in the results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Two sequences that must share an index do not.
    #[error("indices of {what} need to be identical")]
    Alignment { what: String },

    /// A caller-supplied selector or option is not recognized or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Columns or index/value pairs of different lengths.
    #[error("{what} must have length {expected}, but has {found}")]
    LengthMismatch {
        what: String,
        expected: usize,
        found: usize,
    },
}

impl AnalysisError {
    pub(crate) fn alignment(what: impl Into<String>) -> Self {
        Self::Alignment { what: what.into() }
    }
}
