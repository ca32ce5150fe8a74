//! Errors raised by objective evaluation and prediction.

use thiserror::Error;

/// Model-level failures.
///
/// `NonFinite` marks an internal invariant violation: the stability guards
/// should make it unreachable for finite inputs, and it aborts training
/// rather than handing a NaN to the minimizer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: String,
        actual: String,
        context: String,
    },

    #[error("Non-finite value produced by {context}")]
    NonFinite { context: String },

    #[error("Empty input: {0}")]
    EmptyInput(String),
}

impl ModelError {
    pub(crate) fn shape(
        context: &str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ModelError::ShapeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
            context: context.to_string(),
        }
    }
}
