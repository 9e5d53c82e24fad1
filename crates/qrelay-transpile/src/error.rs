use qrelay_domain::{FormatId, StatusHint};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TranspileError {
    #[error("no conversion path from {from} to any of {to:?}")]
    NoPath { from: FormatId, to: Vec<FormatId> },

    #[error("edge {from} -> {to} failed: {message}")]
    EdgeFailed {
        from: FormatId,
        to: FormatId,
        message: String,
    },
}

impl TranspileError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            TranspileError::NoPath { .. } => StatusHint::Validation,
            TranspileError::EdgeFailed { .. } => StatusHint::Validation,
        }
    }
}
