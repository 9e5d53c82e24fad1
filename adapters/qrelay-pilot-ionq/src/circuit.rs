//! `PreparedCircuit` -> IonQ's native `ionq.circuit.v0` gate-list JSON.
//!
//! Unlike the IBM/Braket pilots, IonQ's REST API does not take circuit text
//! at all — submissions carry a `{"qubits": n, "circuit": [...]}` body of
//! per-gate JSON objects, and measurement is implicit over every qubit.
//! `Instruction::Measure`/`Barrier` carry no IonQ wire representation and
//! are dropped during emission; `Instruction::Reset` has no IonQ QPU
//! equivalent and is rejected.

use serde::Serialize;

use qrelay_domain::{InstructionKind, PreparedCircuit, QubitId};

use crate::error::{IonqError, IonqResult};

/// One gate operation in IonQ's native circuit JSON.
#[derive(Debug, Clone, Serialize)]
pub struct IonqGate {
    pub gate: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

/// The `input` body of an IonQ job submission.
#[derive(Debug, Clone, Serialize)]
pub struct IonqCircuit {
    pub qubits: usize,
    pub circuit: Vec<IonqGate>,
}

/// Builds the native circuit body IonQ's job-submission endpoint expects.
pub fn emit(circuit: &PreparedCircuit) -> IonqResult<IonqCircuit> {
    let mut gates = Vec::new();

    for inst in &circuit.instructions {
        match &inst.kind {
            InstructionKind::Gate { name, params } => {
                gates.push(gate_for(name, &inst.qubits, params)?);
            }
            InstructionKind::Measure { .. } | InstructionKind::Barrier => {}
            InstructionKind::Reset => {
                return Err(IonqError::CircuitError(
                    "IonQ hardware does not support mid-circuit reset".to_string(),
                ));
            }
        }
    }

    Ok(IonqCircuit {
        qubits: circuit.num_qubits,
        circuit: gates,
    })
}

fn gate_for(name: &str, qubits: &[QubitId], params: &[f64]) -> IonqResult<IonqGate> {
    let ids: Vec<usize> = qubits.iter().map(|q| q.0).collect();
    let lower = name.to_lowercase();

    let (gate, targets, controls, rotation) = match lower.as_str() {
        "h" | "x" | "y" | "z" | "s" | "sdg" | "t" | "tdg" | "v" | "vi" => {
            (lower, ids, Vec::new(), None)
        }
        "rx" | "ry" | "rz" => {
            let angle = *params.first().ok_or_else(|| {
                IonqError::CircuitError(format!("{lower} requires a rotation angle"))
            })?;
            (lower, ids, Vec::new(), Some(angle))
        }
        "cnot" | "cx" => {
            let (controls, targets) = split_control_target(&ids, 1)?;
            ("cnot".to_string(), targets, controls, None)
        }
        "cz" => {
            let (controls, targets) = split_control_target(&ids, 1)?;
            ("cz".to_string(), targets, controls, None)
        }
        "swap" => ("swap".to_string(), ids, Vec::new(), None),
        "toffoli" | "ccx" => {
            let (controls, targets) = split_control_target(&ids, 1)?;
            ("cnot".to_string(), targets, controls, None)
        }
        other => {
            return Err(IonqError::CircuitError(format!("unsupported gate for IonQ: {other}")));
        }
    };

    Ok(IonqGate {
        gate,
        targets,
        controls,
        rotation,
    })
}

/// Splits a qubit-operand list into `(controls, targets)`, with the last
/// `num_targets` operands as targets and the rest as controls.
fn split_control_target(ids: &[usize], num_targets: usize) -> IonqResult<(Vec<usize>, Vec<usize>)> {
    if ids.len() <= num_targets {
        return Err(IonqError::CircuitError(
            "controlled gate requires at least one control qubit".to_string(),
        ));
    }
    let split_at = ids.len() - num_targets;
    Ok((ids[..split_at].to_vec(), ids[split_at..].to_vec()))
}

/// Converts IonQ's decimal-state-keyed histogram (`{"0": 0.5, "3": 0.5}`)
/// into bitstring counts scaled by `shots`. Bitstrings, not hex, are still
/// provider-local at this point — `pilot::histogram_to_rows` routes this
/// output through `qrelay_normalize::binary_to_hex` before it reaches a
/// result row, matching `IONQPilot._binary_counts_to_hex`'s role.
pub fn histogram_to_counts(
    histogram: &std::collections::HashMap<String, f64>,
    num_qubits: usize,
    shots: u32,
) -> std::collections::HashMap<String, u64> {
    let mut counts = std::collections::HashMap::new();
    for (state, &prob) in histogram {
        let Ok(value) = state.parse::<u64>() else {
            continue;
        };
        let bitstring = format!("{value:0>width$b}", width = num_qubits.max(1));
        let count = (prob * f64::from(shots)).max(0.0).round() as u64;
        if count > 0 {
            counts.insert(bitstring, count);
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::{Instruction, InstructionKind};

    #[test]
    fn bell_pair_emits_h_and_cnot() {
        let mut circuit = PreparedCircuit::new(2, 2);
        circuit.push(Instruction::gate("h", vec![QubitId(0)], vec![]));
        circuit.push(Instruction::gate("cx", vec![QubitId(0), QubitId(1)], vec![]));

        let ionq = emit(&circuit).unwrap();
        assert_eq!(ionq.qubits, 2);
        assert_eq!(ionq.circuit.len(), 2);
        assert_eq!(ionq.circuit[0].gate, "h");
        assert_eq!(ionq.circuit[1].gate, "cnot");
        assert_eq!(ionq.circuit[1].controls, vec![0]);
        assert_eq!(ionq.circuit[1].targets, vec![1]);
    }

    #[test]
    fn rotation_gate_carries_angle() {
        let mut circuit = PreparedCircuit::new(1, 0);
        circuit.push(Instruction::gate("rx", vec![QubitId(0)], vec![1.25]));

        let ionq = emit(&circuit).unwrap();
        assert_eq!(ionq.circuit[0].rotation, Some(1.25));
    }

    #[test]
    fn reset_is_rejected() {
        let mut circuit = PreparedCircuit::new(1, 1);
        circuit.push(Instruction {
            kind: InstructionKind::Reset,
            qubits: vec![QubitId(0)],
        });
        assert!(emit(&circuit).is_err());
    }

    #[test]
    fn histogram_scales_to_counts() {
        let mut histogram = std::collections::HashMap::new();
        histogram.insert("0".to_string(), 0.5);
        histogram.insert("3".to_string(), 0.5);

        let counts = histogram_to_counts(&histogram, 2, 1000);
        assert_eq!(counts.get("00"), Some(&500));
        assert_eq!(counts.get("11"), Some(&500));
    }
}
