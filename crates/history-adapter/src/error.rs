//! Errors raised by the engine itself.
//!
//! Errors returned by caller recipes are never wrapped in this type; they
//! travel through `anyhow::Error` exactly as the recipe produced them.
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// A history limit of zero would discard every entry.
    #[error("history limit must be at least 1, got {0}")]
    InvalidLimit(usize),

    /// A delta could not be captured or replayed against the present value.
    #[error("patch failed at `{path}`: {reason}")]
    Patch { path: String, reason: String },
}

impl HistoryError {
    pub(crate) fn patch(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Patch {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
