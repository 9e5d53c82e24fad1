//! Error types for the IonQ adapter.

use thiserror::Error;

/// Result type for IonQ operations.
pub type IonqResult<T> = Result<T, IonqError>;

/// Errors that can occur when using IonQ.
#[derive(Debug, Error)]
pub enum IonqError {
    /// Missing API token.
    #[error("IonQ API token not found. Set IONQ_TOKEN environment variable.")]
    MissingToken,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("IonQ API error: {message}")]
    ApiError {
        /// Error message.
        message: String,
    },

    /// Job not found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job failed.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// Job was cancelled.
    #[error("Job was cancelled: {0}")]
    JobCancelled(String),

    /// Circuit conversion error.
    #[error("Circuit conversion error: {0}")]
    CircuitError(String),

    /// Backend not available.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Timeout waiting for job.
    #[error("Timeout waiting for job")]
    Timeout,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Circuit too large for backend.
    #[error("Circuit requires {required} qubits but backend only has {available}")]
    TooManyQubits {
        /// Qubits needed.
        required: usize,
        /// Qubits available.
        available: usize,
    },

    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<IonqError> for qrelay_pilot::PilotError {
    fn from(e: IonqError) -> Self {
        match e {
            IonqError::MissingToken => qrelay_pilot::PilotError::Unauthorized(e.to_string()),
            IonqError::JobFailed(msg) => qrelay_pilot::PilotError::Internal(msg),
            IonqError::JobCancelled(_) => qrelay_pilot::PilotError::CancelUnsupported,
            IonqError::BackendUnavailable(msg) => qrelay_pilot::PilotError::ProviderUnavailable(msg),
            IonqError::Timeout => qrelay_pilot::PilotError::Timeout(std::time::Duration::from_secs(300)),
            IonqError::TooManyQubits {
                required,
                available,
            } => qrelay_pilot::PilotError::InvalidCircuit(format!(
                "circuit requires {required} qubits but backend only has {available}"
            )),
            IonqError::CircuitError(msg) => qrelay_pilot::PilotError::InvalidCircuit(msg),
            IonqError::HttpError(_) => qrelay_pilot::PilotError::ProviderUnavailable(e.to_string()),
            IonqError::JobNotFound(_) | IonqError::ApiError { .. } => {
                qrelay_pilot::PilotError::ProviderUnavailable(e.to_string())
            }
            _ => qrelay_pilot::PilotError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_display() {
        let err = IonqError::MissingToken;
        assert!(err.to_string().contains("IONQ_TOKEN"));
    }

    #[test]
    fn test_job_failed_display() {
        let err = IonqError::JobFailed("aborted".into());
        assert!(err.to_string().contains("aborted"));
    }

    #[test]
    fn test_too_many_qubits_display() {
        let err = IonqError::TooManyQubits {
            required: 40,
            available: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("40"));
        assert!(msg.contains("25"));
    }

    use qrelay_pilot::PilotError;

    #[test]
    fn test_missing_token_to_pilot_unauthorized() {
        let pe: PilotError = IonqError::MissingToken.into();
        assert!(matches!(pe, PilotError::Unauthorized(_)));
    }

    #[test]
    fn test_job_cancelled_to_pilot_cancel_unsupported() {
        let pe: PilotError = IonqError::JobCancelled("user".into()).into();
        assert!(matches!(pe, PilotError::CancelUnsupported));
    }

    #[test]
    fn test_too_many_qubits_to_pilot_invalid_circuit() {
        let pe: PilotError = IonqError::TooManyQubits {
            required: 40,
            available: 25,
        }
        .into();
        assert!(matches!(pe, PilotError::InvalidCircuit(_)));
    }

    #[test]
    fn test_backend_unavailable_to_pilot() {
        let pe: PilotError = IonqError::BackendUnavailable("qpu.harmony".into()).into();
        assert!(matches!(pe, PilotError::ProviderUnavailable(msg) if msg == "qpu.harmony"));
    }
}
