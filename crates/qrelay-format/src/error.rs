use thiserror::Error;

use qrelay_domain::StatusHint;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("{format} pre-processor rejected input: {message}")]
    PreprocessFailed { format: String, message: String },
}

impl FormatError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            FormatError::UnknownFormat(_) => StatusHint::Validation,
            FormatError::PreprocessFailed { .. } => StatusHint::Validation,
        }
    }
}
