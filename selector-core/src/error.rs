//! Error types for selector-core.
//!
//! Everything here is raised while a selector, its options or an index
//! specification are being built. Nothing in this crate talks to a backend.

use thiserror::Error;

/// Selector construction error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("{0} combinator needs at least one child")]
    EmptyCombinator(&'static str),

    #[error("Array match on '{0}' needs at least one inner expression")]
    EmptyArrayMatch(String),

    #[error("Empty field path is only allowed inside an array match")]
    ElementPathOutsideArray,

    #[error("Invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Projection needs at least one field")]
    EmptyProjection,

    #[error("Sort needs at least one field")]
    EmptySort,

    #[error("Index needs at least one field")]
    EmptyIndex,

    #[error("Empty field name in {0}")]
    EmptyFieldName(&'static str),
}

/// Result type for selector operations
pub type SelectorResult<T> = Result<T, SelectorError>;

impl serde::Serialize for SelectorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
