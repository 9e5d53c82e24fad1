//! Error types for AWS Braket adapter.

use thiserror::Error;

/// Result type for Braket operations.
pub type BraketResult<T> = Result<T, BraketError>;

/// Errors that can occur when using AWS Braket.
#[derive(Debug, Error)]
pub enum BraketError {
    /// Missing AWS credentials.
    #[error("AWS credentials not found. Configure via environment, SSO, or IAM role.")]
    MissingCredentials,

    /// Missing S3 bucket configuration.
    #[error("S3 bucket not configured. Set ARVAK_BRAKET_S3_BUCKET environment variable.")]
    MissingS3Bucket,

    /// Invalid device ARN.
    #[error("Invalid device ARN: {0}")]
    InvalidDeviceArn(String),

    /// Braket API error.
    #[error("Braket API error: {0}")]
    BraketApi(String),

    /// S3 error.
    #[error("S3 error: {0}")]
    S3Error(String),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task failed.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Task was cancelled.
    #[error("Task was cancelled: {0}")]
    TaskCancelled(String),

    /// Circuit conversion error.
    #[error("Circuit conversion error: {0}")]
    CircuitError(String),

    /// Device unavailable.
    #[error("Device not available: {0}")]
    DeviceUnavailable(String),

    /// Timeout waiting for task.
    #[error("Timeout waiting for task")]
    Timeout,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Circuit too large for device.
    #[error("Circuit requires {required} qubits but device only has {available}")]
    TooManyQubits {
        /// Qubits needed.
        required: usize,
        /// Qubits available.
        available: usize,
    },

    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Result parsing error.
    #[error("Failed to parse task result: {0}")]
    ResultParseError(String),
}

impl From<BraketError> for qrelay_pilot::PilotError {
    fn from(e: BraketError) -> Self {
        match e {
            BraketError::MissingCredentials | BraketError::MissingS3Bucket => {
                qrelay_pilot::PilotError::Unauthorized(e.to_string())
            }
            BraketError::TaskFailed(msg) => qrelay_pilot::PilotError::Internal(msg),
            BraketError::TaskCancelled(_) => qrelay_pilot::PilotError::CancelUnsupported,
            BraketError::DeviceUnavailable(msg) => qrelay_pilot::PilotError::ProviderUnavailable(msg),
            BraketError::Timeout => {
                qrelay_pilot::PilotError::Timeout(std::time::Duration::from_secs(300))
            }
            BraketError::TooManyQubits {
                required,
                available,
            } => qrelay_pilot::PilotError::InvalidCircuit(format!(
                "circuit requires {required} qubits but device only has {available}"
            )),
            BraketError::CircuitError(msg) => qrelay_pilot::PilotError::InvalidCircuit(msg),
            BraketError::InvalidDeviceArn(msg) => qrelay_pilot::PilotError::InvalidCircuit(msg),
            BraketError::TaskNotFound(_) | BraketError::BraketApi(_) | BraketError::S3Error(_) => {
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
    fn test_missing_credentials_display() {
        let err = BraketError::MissingCredentials;
        assert!(err.to_string().contains("AWS credentials"));
    }

    #[test]
    fn test_missing_s3_bucket_display() {
        let err = BraketError::MissingS3Bucket;
        assert!(err.to_string().contains("ARVAK_BRAKET_S3_BUCKET"));
    }

    #[test]
    fn test_invalid_device_arn_display() {
        let err = BraketError::InvalidDeviceArn("bad-arn".into());
        assert!(err.to_string().contains("bad-arn"));
    }

    #[test]
    fn test_task_not_found_display() {
        let err = BraketError::TaskNotFound("arn:aws:braket:us-east-1:123:task/abc".into());
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_too_many_qubits_display() {
        let err = BraketError::TooManyQubits {
            required: 50,
            available: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("50"));
        assert!(msg.contains("25"));
    }

    // -- PilotError conversion tests --

    use qrelay_pilot::PilotError;

    #[test]
    fn test_missing_credentials_to_pilot_unauthorized() {
        let pe: PilotError = BraketError::MissingCredentials.into();
        assert!(matches!(pe, PilotError::Unauthorized(_)));
    }

    #[test]
    fn test_missing_s3_to_pilot_unauthorized() {
        let pe: PilotError = BraketError::MissingS3Bucket.into();
        assert!(matches!(pe, PilotError::Unauthorized(_)));
    }

    #[test]
    fn test_task_not_found_to_pilot_provider_unavailable() {
        let pe: PilotError = BraketError::TaskNotFound("t1".into()).into();
        assert!(matches!(pe, PilotError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_task_failed_to_pilot_internal() {
        let pe: PilotError = BraketError::TaskFailed("boom".into()).into();
        assert!(matches!(pe, PilotError::Internal(msg) if msg == "boom"));
    }

    #[test]
    fn test_task_cancelled_to_pilot_cancel_unsupported() {
        let pe: PilotError = BraketError::TaskCancelled("user".into()).into();
        assert!(matches!(pe, PilotError::CancelUnsupported));
    }

    #[test]
    fn test_device_unavailable_to_pilot() {
        let pe: PilotError = BraketError::DeviceUnavailable("offline".into()).into();
        assert!(matches!(pe, PilotError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_timeout_to_pilot() {
        let pe: PilotError = BraketError::Timeout.into();
        assert!(matches!(pe, PilotError::Timeout(_)));
    }

    #[test]
    fn test_too_many_qubits_to_pilot_invalid_circuit() {
        let pe: PilotError = BraketError::TooManyQubits {
            required: 50,
            available: 25,
        }
        .into();
        assert!(matches!(pe, PilotError::InvalidCircuit(_)));
    }

    #[test]
    fn test_circuit_error_to_pilot_invalid_circuit() {
        let pe: PilotError = BraketError::CircuitError("bad gate".into()).into();
        assert!(matches!(pe, PilotError::InvalidCircuit(_)));
    }

    #[test]
    fn test_braket_api_to_pilot_provider_unavailable() {
        let pe: PilotError = BraketError::BraketApi("server error".into()).into();
        assert!(matches!(pe, PilotError::ProviderUnavailable(_)));
    }
}
