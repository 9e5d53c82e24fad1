//! Error taxonomy for the Rigetti pilot.
//!
//! There is no network client here, so this is much narrower than the
//! REST-backed pilots' error sets — a circuit this pilot can't simulate is
//! the only failure mode that isn't already a [`qrelay_pilot::PilotError`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RigettiError {
    #[error("circuit exceeds the 9q-qvm's {available} qubits (needs {required})")]
    TooManyQubits { required: u32, available: u32 },

    #[error("invalid circuit for rigetti: {0}")]
    CircuitError(String),
}

impl From<RigettiError> for qrelay_pilot::PilotError {
    fn from(err: RigettiError) -> Self {
        match err {
            RigettiError::TooManyQubits { required, available } => {
                qrelay_pilot::PilotError::InvalidCircuit(format!(
                    "circuit needs {required} qubits, 9q-qvm supports {available}"
                ))
            }
            RigettiError::CircuitError(msg) => qrelay_pilot::PilotError::InvalidCircuit(msg),
        }
    }
}

pub type RigettiResult<T> = Result<T, RigettiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_pilot::PilotError;

    #[test]
    fn too_many_qubits_maps_to_invalid_circuit() {
        let err: PilotError = RigettiError::TooManyQubits {
            required: 12,
            available: 9,
        }
        .into();
        assert!(matches!(err, PilotError::InvalidCircuit(_)));
    }

    #[test]
    fn circuit_error_maps_to_invalid_circuit() {
        let err: PilotError = RigettiError::CircuitError("bad gate".to_string()).into();
        assert!(matches!(err, PilotError::InvalidCircuit(_)));
    }
}
