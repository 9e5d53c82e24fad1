use qrelay_domain::StatusHint;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OrchestratorError {
    #[error(transparent)]
    Domain(#[from] qrelay_domain::DomainError),

    #[error(transparent)]
    Format(#[from] qrelay_format::FormatError),

    #[error(transparent)]
    Transpile(#[from] qrelay_transpile::TranspileError),

    #[error(transparent)]
    Pilot(#[from] qrelay_pilot::PilotError),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("job queue is full")]
    QueueFull,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cancellation is not implemented in synchronous dispatch mode")]
    NotImplementedInSyncMode,
}

impl OrchestratorError {
    pub fn status_hint(&self) -> StatusHint {
        match self {
            OrchestratorError::Domain(e) => e.status_hint(),
            OrchestratorError::Format(e) => e.status_hint(),
            OrchestratorError::Transpile(e) => e.status_hint(),
            OrchestratorError::Pilot(e) => e.status_hint(),
            OrchestratorError::UnknownProvider(_) => StatusHint::Validation,
            OrchestratorError::UnknownDevice(_) => StatusHint::Validation,
            OrchestratorError::QueueFull => StatusHint::Unavailable,
            OrchestratorError::Storage(_) => StatusHint::Internal,
            OrchestratorError::NotImplementedInSyncMode => StatusHint::NotImplemented,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
