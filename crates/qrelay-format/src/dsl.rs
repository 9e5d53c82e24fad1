//! Bounded, non-executing pre-processors for the Python-embedded DSL formats
//! and the quil-like textual format (spec §4.1, Design Notes §9).
//!
//! Design Notes §9 requires the dynamic-execution replacement to be "a
//! bounded evaluator" with no interpreter state shared across jobs. Instead
//! of hosting an interpreter, each of these parses a small, explicitly
//! whitelisted gate-call grammar in a single linear scan — no loops or
//! recursion in the grammar itself, so the work done per input is bounded by
//! its length alone.

use qrelay_domain::{ClbitId, Instruction, PreparedCircuit, QubitId};

use crate::error::FormatError;

/// `(op arg arg ...)` s-expression grammar shared by DSL A/B/C in this
/// repo's bounded-evaluator simplification (see crate docs and DESIGN.md).
///
/// Recognized ops: `qubits n`, `clbits n`, a fixed single-qubit gate set
/// (`h x y z s sdg t tdg`), the two-qubit `cx`/`cz`/`swap`, the
/// parameterized `rx`/`ry`/`rz`/`p` (first arg is the angle), and
/// `measure q c`.
pub fn preprocess_sexpr(source: &str, format_name: &str) -> Result<PreparedCircuit, FormatError> {
    let mut num_qubits = 0u32;
    let mut num_clbits = 0u32;
    let mut instructions = Vec::new();

    for expr in split_expressions(source, format_name)? {
        let mut tokens = expr.split_whitespace();
        let op = tokens.next().ok_or_else(|| reject(format_name, "empty expression"))?;
        let rest: Vec<&str> = tokens.collect();

        match op {
            "qubits" => num_qubits = parse_u32(format_name, &rest, 0)?,
            "clbits" => num_clbits = parse_u32(format_name, &rest, 0)?,
            "h" | "x" | "y" | "z" | "s" | "sdg" | "t" | "tdg" => {
                let q = parse_u32(format_name, &rest, 0)?;
                instructions.push(Instruction::gate(op, vec![QubitId(q)], vec![]));
            }
            "cx" | "cz" | "swap" => {
                let a = parse_u32(format_name, &rest, 0)?;
                let b = parse_u32(format_name, &rest, 1)?;
                instructions.push(Instruction::gate(op, vec![QubitId(a), QubitId(b)], vec![]));
            }
            "rx" | "ry" | "rz" | "p" => {
                let theta = parse_f64(format_name, &rest, 0)?;
                let q = parse_u32(format_name, &rest, 1)?;
                instructions.push(Instruction::gate(op, vec![QubitId(q)], vec![theta]));
            }
            "measure" => {
                let q = parse_u32(format_name, &rest, 0)?;
                let c = parse_u32(format_name, &rest, 1)?;
                instructions.push(Instruction::measure(QubitId(q), ClbitId(c)));
            }
            other => return Err(reject(format_name, &format!("unrecognized op '{other}'"))),
        }
    }

    let mut circuit = PreparedCircuit::new(num_qubits, num_clbits);
    circuit.instructions = instructions;
    Ok(circuit)
}

/// A quil-like line grammar: one `OP arg arg` statement per line, no
/// parentheses. Registered as this format's pre-processor since its wire
/// form needs nothing beyond a single whitespace-bounded scan.
pub fn preprocess_quil_lines(source: &str) -> Result<PreparedCircuit, FormatError> {
    let mut max_qubit = 0i64;
    let mut max_clbit = -1i64;
    let mut instructions = Vec::new();

    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let op = tokens
            .next()
            .ok_or_else(|| reject("quil_text", "empty line"))?;
        let rest: Vec<&str> = tokens.collect();

        match op.to_ascii_uppercase().as_str() {
            "H" | "X" | "Y" | "Z" => {
                let q = parse_u32("quil_text", &rest, 0)?;
                max_qubit = max_qubit.max(q as i64);
                instructions.push(Instruction::gate(op.to_ascii_lowercase(), vec![QubitId(q)], vec![]));
            }
            "CNOT" => {
                let a = parse_u32("quil_text", &rest, 0)?;
                let b = parse_u32("quil_text", &rest, 1)?;
                max_qubit = max_qubit.max(a as i64).max(b as i64);
                instructions.push(Instruction::gate("cx", vec![QubitId(a), QubitId(b)], vec![]));
            }
            "MEASURE" => {
                let q = parse_u32("quil_text", &rest, 0)?;
                let c = parse_u32("quil_text", &rest, 1)?;
                max_qubit = max_qubit.max(q as i64);
                max_clbit = max_clbit.max(c as i64);
                instructions.push(Instruction::measure(QubitId(q), ClbitId(c)));
            }
            other => return Err(reject("quil_text", &format!("unrecognized op '{other}'"))),
        }
    }

    let mut circuit = PreparedCircuit::new((max_qubit + 1) as u32, (max_clbit + 1) as u32);
    circuit.instructions = instructions;
    Ok(circuit)
}

fn split_expressions<'a>(source: &'a str, format_name: &str) -> Result<Vec<&'a str>, FormatError> {
    let mut exprs = Vec::new();
    let mut depth = 0i32;
    let mut start = None;
    for (i, c) in source.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(reject(format_name, "unbalanced parentheses"));
                }
                if depth == 0 {
                    let s = start.take().ok_or_else(|| reject(format_name, "unbalanced parentheses"))?;
                    exprs.push(&source[s..i]);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(reject(format_name, "unbalanced parentheses"));
    }
    Ok(exprs)
}

fn parse_u32(format_name: &str, args: &[&str], idx: usize) -> Result<u32, FormatError> {
    args.get(idx)
        .ok_or_else(|| reject(format_name, "missing argument"))?
        .parse()
        .map_err(|_| reject(format_name, "expected an integer argument"))
}

fn parse_f64(format_name: &str, args: &[&str], idx: usize) -> Result<f64, FormatError> {
    args.get(idx)
        .ok_or_else(|| reject(format_name, "missing argument"))?
        .parse()
        .map_err(|_| reject(format_name, "expected a numeric argument"))
}

fn reject(format_name: &str, message: &str) -> FormatError {
    FormatError::PreprocessFailed {
        format: format_name.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sexpr_bell_pair() {
        let src = "(qubits 2) (clbits 2) (h 0) (cx 0 1) (measure 0 0) (measure 1 1)";
        let circuit = preprocess_sexpr(src, "dsl_a").unwrap();
        assert_eq!(circuit.num_qubits, 2);
        assert_eq!(circuit.instructions.len(), 4);
    }

    #[test]
    fn sexpr_rejects_unknown_op() {
        let err = preprocess_sexpr("(frobnicate 0)", "dsl_a").unwrap_err();
        assert!(matches!(err, FormatError::PreprocessFailed { .. }));
    }

    #[test]
    fn sexpr_rejects_unbalanced_parens() {
        let err = preprocess_sexpr("(h 0", "dsl_a").unwrap_err();
        assert!(matches!(err, FormatError::PreprocessFailed { .. }));
    }

    #[test]
    fn quil_lines_bell_pair() {
        let src = "H 0\nCNOT 0 1\nMEASURE 0 0\nMEASURE 1 1\n";
        let circuit = preprocess_quil_lines(src).unwrap();
        assert_eq!(circuit.num_qubits, 2);
        assert_eq!(circuit.num_clbits, 2);
        assert_eq!(circuit.instructions.len(), 4);
    }
}
