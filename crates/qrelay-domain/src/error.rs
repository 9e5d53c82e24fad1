//! Shared error taxonomy (spec §7).
//!
//! Every crate in this workspace maps its own error enum onto the same
//! small set of *intents* rather than depending on an HTTP crate to express
//! "this is a 404". The HTTP surface (out of scope) is the one place that
//! turns [`StatusHint`] into an actual status code.

use thiserror::Error;

/// The HTTP-status intent behind an error, without depending on an HTTP crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatusHint {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    NotImplemented,
    Unavailable,
    Internal,
}

/// Errors that can occur while manipulating domain entities directly
/// (construction, state transitions, ownership checks).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: String, to: String },

    #[error("ownership mismatch: caller does not own this entity")]
    Forbidden,

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            DomainError::InvalidStateTransition { .. } => StatusHint::Conflict,
            DomainError::Forbidden => StatusHint::Forbidden,
            DomainError::NotFound(_) => StatusHint::NotFound,
            DomainError::Validation(_) => StatusHint::Validation,
        }
    }
}
