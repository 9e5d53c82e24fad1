//! `PreparedCircuit` -> `OpenQASM` 3.0 text, for providers whose REST API
//! only accepts a circuit as a string. There is no shared emit crate in this
//! workspace (`qrelay-format` only goes source-text -> `PreparedCircuit`,
//! never the reverse), so each REST-calling pilot carries its own small
//! local emitter, the same way the teacher's per-adapter `circuit_to_qasm`
//! wraps a shared emit function.

use qrelay_domain::{InstructionKind, PreparedCircuit};

use crate::error::{IbmError, IbmResult};

/// Emits `OpenQASM 3.0` with a `stdgates.inc` include, matching what
/// `IbmClient::submit_sampler_job` expects as circuit text.
pub fn emit(circuit: &PreparedCircuit) -> IbmResult<String> {
    let mut out = String::new();
    out.push_str("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n");
    out.push_str(&format!("qubit[{}] q;\n", circuit.num_qubits.max(1)));
    out.push_str(&format!("bit[{}] c;\n", circuit.num_clbits.max(1)));

    for inst in &circuit.instructions {
        match &inst.kind {
            InstructionKind::Gate { name, params } => {
                let qubits = qubit_list(&inst.qubits);
                if params.is_empty() {
                    out.push_str(&format!("{name} {qubits};\n"));
                } else {
                    let args = params
                        .iter()
                        .map(|p| format!("{p}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    out.push_str(&format!("{name}({args}) {qubits};\n"));
                }
            }
            InstructionKind::Measure { clbit } => {
                let qubit = inst
                    .qubits
                    .first()
                    .ok_or_else(|| IbmError::CircuitError("measure with no qubit operand".to_string()))?;
                out.push_str(&format!("c[{}] = measure q[{}];\n", clbit.0, qubit.0));
            }
            InstructionKind::Reset => {
                let qubit = inst
                    .qubits
                    .first()
                    .ok_or_else(|| IbmError::CircuitError("reset with no qubit operand".to_string()))?;
                out.push_str(&format!("reset q[{}];\n", qubit.0));
            }
            InstructionKind::Barrier => {
                out.push_str(&format!("barrier {};\n", qubit_list(&inst.qubits)));
            }
        }
    }

    Ok(out)
}

fn qubit_list(qubits: &[qrelay_domain::QubitId]) -> String {
    qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrelay_domain::{ClbitId, Instruction, QubitId};

    #[test]
    fn bell_pair_emits_expected_lines() {
        let mut circuit = PreparedCircuit::new(2, 2);
        circuit.push(Instruction::gate("h", vec![QubitId(0)], vec![]));
        circuit.push(Instruction::gate("cx", vec![QubitId(0), QubitId(1)], vec![]));
        circuit.push(Instruction::measure(QubitId(0), ClbitId(0)));
        circuit.push(Instruction::measure(QubitId(1), ClbitId(1)));

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.starts_with("OPENQASM 3.0;\ninclude \"stdgates.inc\";\n"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("h q[0];"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("c[0] = measure q[0];"));
        assert!(qasm.contains("c[1] = measure q[1];"));
    }

    #[test]
    fn parameterized_gate_renders_angle_list() {
        let mut circuit = PreparedCircuit::new(1, 0);
        circuit.push(Instruction::gate("rx", vec![QubitId(0)], vec![1.5707963267948966]));

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("rx(1.5707963267948966) q[0];"));
    }
}
