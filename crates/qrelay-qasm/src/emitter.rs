//! Emits a [`PreparedCircuit`] back to `OpenQASM` 2 text.
//!
//! Kept mostly for archival/debugging use (storing a human-readable copy of
//! a transpiled circuit) — the pilot contract in this workspace takes
//! [`PreparedCircuit`] directly, so emitting text is not on the hot path.

use qrelay_domain::{InstructionKind, PreparedCircuit};

use crate::error::{ParseError, ParseResult};

pub fn emit_qasm2(circuit: &PreparedCircuit) -> ParseResult<String> {
    let mut out = String::new();
    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");
    out.push_str(&format!("qreg q[{}];\n", circuit.num_qubits));
    if circuit.num_clbits > 0 {
        out.push_str(&format!("creg c[{}];\n", circuit.num_clbits));
    }

    for instruction in &circuit.instructions {
        match &instruction.kind {
            InstructionKind::Gate { name, params } => {
                out.push_str(name);
                if !params.is_empty() {
                    let joined = params
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push('(');
                    out.push_str(&joined);
                    out.push(')');
                }
                out.push(' ');
                let operands = instruction
                    .qubits
                    .iter()
                    .map(|q| format!("q[{}]", q.0))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push_str(&operands);
                out.push_str(";\n");
            }
            InstructionKind::Measure { clbit } => {
                let qubit = instruction.qubits.first().ok_or_else(|| {
                    ParseError::Generic("measure instruction missing qubit operand".to_string())
                })?;
                out.push_str(&format!("measure q[{}] -> c[{}];\n", qubit.0, clbit.0));
            }
            InstructionKind::Reset => {
                let qubit = instruction.qubits.first().ok_or_else(|| {
                    ParseError::Generic("reset instruction missing qubit operand".to_string())
                })?;
                out.push_str(&format!("reset q[{}];\n", qubit.0));
            }
            InstructionKind::Barrier => {
                let operands = instruction
                    .qubits
                    .iter()
                    .map(|q| format!("q[{}]", q.0))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push_str(&format!("barrier {operands};\n"));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn round_trips_bell_pair_through_text() {
        let src = "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0],q[1];\nmeasure q -> c;\n";
        let circuit = parse(src).unwrap();
        let emitted = emit_qasm2(&circuit).unwrap();
        let reparsed = parse(&emitted).unwrap();
        assert_eq!(circuit, reparsed);
    }
}
