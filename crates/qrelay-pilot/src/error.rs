//! Error taxonomy for pilot operations (spec §7).

use qrelay_domain::StatusHint;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PilotError {
    #[error("provider rejected authentication: {0}")]
    Unauthorized(String),

    #[error("pilot does not support job type: {0}")]
    UnsupportedJobType(String),

    #[error("pilot cannot cancel an in-flight job")]
    CancelUnsupported,

    #[error("device unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid circuit for this provider: {0}")]
    InvalidCircuit(String),

    #[error("internal pilot error: {0}")]
    Internal(String),
}

impl PilotError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            PilotError::Unauthorized(_) => StatusHint::Unauthorized,
            PilotError::UnsupportedJobType(_) => StatusHint::NotImplemented,
            PilotError::CancelUnsupported => StatusHint::NotImplemented,
            PilotError::ProviderUnavailable(_) => StatusHint::Unavailable,
            PilotError::Timeout(_) => StatusHint::Unavailable,
            PilotError::InvalidCircuit(_) => StatusHint::Validation,
            PilotError::Internal(_) => StatusHint::Internal,
        }
    }

    /// Whether a retry with backoff is worth attempting (spec §4.5's
    /// retry-around-the-provider-call policy), as opposed to a permanent
    /// failure that should record an ERROR result immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PilotError::ProviderUnavailable(_) | PilotError::Timeout(_)
        )
    }
}

pub type PilotResult<T> = Result<T, PilotError>;
