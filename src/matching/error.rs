//! Error types for the matching module.

use thiserror::Error;

/// Errors raised while constructing a [`MatchTarget`].
///
/// A target with a missing field has no meaningful partial form, so
/// construction is the rejection point - scoring never sees an incomplete
/// target.
///
/// [`MatchTarget`]: super::MatchTarget
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchTargetError {
    /// A required field was never supplied to the builder.
    #[error("match target is missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
}

impl MatchTargetError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }
}
