//! A flat, format-agnostic circuit representation.
//!
//! Deliberately not a DAG: format conversion and pilot submission only ever
//! need "the ordered list of operations", never a reorderable optimizer IR.
//! See the crate-level Non-goals note for why this stops here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A named gate applied to its qubit operands, e.g. `h`, `cx`, `rz`.
    Gate { name: String, params: Vec<f64> },
    /// Measure a qubit into a classical bit.
    Measure { clbit: ClbitId },
    /// Reset a qubit to `|0>`.
    Reset,
    /// A barrier across the given qubits; purely advisory.
    Barrier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub qubits: Vec<QubitId>,
}

impl Instruction {
    pub fn gate(name: impl Into<String>, qubits: Vec<QubitId>, params: Vec<f64>) -> Self {
        Self {
            kind: InstructionKind::Gate {
                name: name.into(),
                params,
            },
            qubits,
        }
    }

    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure { clbit },
            qubits: vec![qubit],
        }
    }
}

/// The native object every format pre-processor and every pilot works with.
///
/// Produced by a `Preprocessor` (`qrelay-format`) from source text, carried
/// through the transpiler graph, and handed to a `Pilot::run` once it
/// reaches a format the target provider accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedCircuit {
    pub num_qubits: u32,
    pub num_clbits: u32,
    pub instructions: Vec<Instruction>,
}

impl PreparedCircuit {
    pub fn new(num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            num_qubits,
            num_clbits,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn measured_clbits(&self) -> u32 {
        self.instructions
            .iter()
            .filter_map(|i| match i.kind {
                InstructionKind::Measure { clbit } => Some(clbit.0 + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_pair_construction() {
        let mut circuit = PreparedCircuit::new(2, 2);
        circuit.push(Instruction::gate("h", vec![QubitId(0)], vec![]));
        circuit.push(Instruction::gate(
            "cx",
            vec![QubitId(0), QubitId(1)],
            vec![],
        ));
        circuit.push(Instruction::measure(QubitId(0), ClbitId(0)));
        circuit.push(Instruction::measure(QubitId(1), ClbitId(1)));

        assert_eq!(circuit.instructions.len(), 4);
        assert_eq!(circuit.measured_clbits(), 2);
    }

    #[test]
    fn measured_clbits_is_zero_without_measurement() {
        let circuit = PreparedCircuit::new(1, 1);
        assert_eq!(circuit.measured_clbits(), 0);
    }
}
