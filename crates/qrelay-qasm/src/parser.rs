//! Recursive-descent parser from `OpenQASM` 2/3 source text straight to
//! [`PreparedCircuit`] — no intermediate AST, since nothing downstream of
//! this crate needs one (see the crate-level Non-goals note).

use std::collections::HashMap;

use qrelay_domain::{ClbitId, Instruction, InstructionKind, PreparedCircuit, QubitId};

use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Token};

#[derive(Debug, Clone, Copy)]
struct Register {
    start: u32,
    len: u32,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    qregs: HashMap<String, Register>,
    cregs: HashMap<String, Register>,
    next_qubit: u32,
    next_clbit: u32,
    instructions: Vec<Instruction>,
}

/// Parse `OpenQASM` 2 or 3 source text into a [`PreparedCircuit`].
///
/// Accepts both the `qreg`/`creg` (QASM2) and `qubit[n] name;`/`bit[n] name;`
/// (QASM3) declaration forms, and both the `measure q -> c;` and
/// `c = measure q;` measurement forms.
pub fn parse(source: &str) -> ParseResult<PreparedCircuit> {
    let tokens = tokenize(source)
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|(span, message)| ParseError::LexerError {
            position: span.start,
            message,
        })?
        .into_iter()
        .map(|t| t.token)
        .collect();

    let mut parser = Parser {
        tokens,
        pos: 0,
        qregs: HashMap::new(),
        cregs: HashMap::new(),
        next_qubit: 0,
        next_clbit: 0,
        instructions: Vec::new(),
    };
    parser.parse_program()
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        match self.advance() {
            Some(ref t) if t == expected => Ok(()),
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {expected}"))),
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(name)) => Ok(name),
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected identifier".to_string())),
        }
    }

    fn expect_int(&mut self) -> ParseResult<u32> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v as u32),
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: "integer".to_string(),
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected integer".to_string())),
        }
    }

    fn parse_program(&mut self) -> ParseResult<PreparedCircuit> {
        while self.peek().is_some() {
            self.parse_statement()?;
        }
        let mut circuit = PreparedCircuit::new(self.next_qubit, self.next_clbit);
        circuit.instructions = std::mem::take(&mut self.instructions);
        Ok(circuit)
    }

    fn parse_statement(&mut self) -> ParseResult<()> {
        match self.peek() {
            Some(Token::OpenQasm) => self.parse_version(),
            Some(Token::Include) => self.parse_include(),
            Some(Token::Qreg) => self.parse_register(true, false),
            Some(Token::Creg) => self.parse_register(false, false),
            Some(Token::Qubit) => self.parse_register(true, true),
            Some(Token::Bit) => self.parse_register(false, true),
            Some(Token::Measure) => self.parse_measure_arrow(),
            Some(Token::Reset) => self.parse_reset(),
            Some(Token::Barrier) => self.parse_barrier(),
            Some(Token::Identifier(_)) => self.parse_identifier_led_statement(),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "statement".to_string(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected statement".to_string())),
        }
    }

    fn parse_version(&mut self) -> ParseResult<()> {
        self.advance();
        self.advance(); // version number, either FloatLiteral or IntLiteral
        self.expect(&Token::Semicolon)
    }

    fn parse_include(&mut self) -> ParseResult<()> {
        self.advance();
        self.advance(); // string literal
        self.expect(&Token::Semicolon)
    }

    /// `qreg name[n];` / `creg name[n];` (QASM2) or
    /// `qubit[n] name;` / `bit[n] name;` (QASM3).
    fn parse_register(&mut self, is_quantum: bool, qasm3_order: bool) -> ParseResult<()> {
        self.advance(); // keyword
        let (name, len) = if qasm3_order {
            self.expect(&Token::LBracket)?;
            let len = self.expect_int()?;
            self.expect(&Token::RBracket)?;
            let name = self.expect_identifier()?;
            (name, len)
        } else {
            let name = self.expect_identifier()?;
            self.expect(&Token::LBracket)?;
            let len = self.expect_int()?;
            self.expect(&Token::RBracket)?;
            (name, len)
        };
        self.expect(&Token::Semicolon)?;

        let table = if is_quantum { &mut self.qregs } else { &mut self.cregs };
        if table.contains_key(&name) {
            return Err(ParseError::DuplicateDeclaration(name));
        }
        let start = if is_quantum { self.next_qubit } else { self.next_clbit };
        table.insert(name, Register { start, len });
        if is_quantum {
            self.next_qubit += len;
        } else {
            self.next_clbit += len;
        }
        Ok(())
    }

    /// `measure <qref> -> <cref>;`
    fn parse_measure_arrow(&mut self) -> ParseResult<()> {
        self.advance();
        let qubits = self.parse_qubit_ref()?;
        self.expect(&Token::Arrow)?;
        let clbits = self.parse_clbit_ref()?;
        self.expect(&Token::Semicolon)?;
        self.push_measure_pairs(&qubits, &clbits)
    }

    /// Statements that start with an identifier: either a gate call
    /// (`h q[0];`) or a QASM3-style measurement assignment (`c = measure q;`).
    fn parse_identifier_led_statement(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let name = self.expect_identifier()?;
        if self.peek() == Some(&Token::Eq) {
            self.advance();
            self.expect(&Token::Measure)?;
            self.pos = start; // re-derive clbits from the full ref (may be indexed)
            let clbits = self.parse_clbit_ref()?;
            self.expect(&Token::Eq)?;
            self.expect(&Token::Measure)?;
            let qubits = self.parse_qubit_ref()?;
            self.expect(&Token::Semicolon)?;
            return self.push_measure_pairs(&qubits, &clbits);
        }
        self.parse_gate_call(name)
    }

    fn push_measure_pairs(&mut self, qubits: &[QubitId], clbits: &[ClbitId]) -> ParseResult<()> {
        for (q, c) in qubits.iter().zip(clbits.iter()) {
            self.instructions.push(Instruction::measure(*q, *c));
        }
        Ok(())
    }

    fn parse_reset(&mut self) -> ParseResult<()> {
        self.advance();
        let qubits = self.parse_qubit_ref()?;
        self.expect(&Token::Semicolon)?;
        for q in qubits {
            self.instructions.push(Instruction {
                kind: InstructionKind::Reset,
                qubits: vec![q],
            });
        }
        Ok(())
    }

    fn parse_barrier(&mut self) -> ParseResult<()> {
        self.advance();
        let mut qubits = self.parse_qubit_ref()?;
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            qubits.extend(self.parse_qubit_ref()?);
        }
        self.expect(&Token::Semicolon)?;
        self.instructions.push(Instruction {
            kind: InstructionKind::Barrier,
            qubits,
        });
        Ok(())
    }

    /// `name(params)? qref (, qref)*;`
    fn parse_gate_call(&mut self, name: String) -> ParseResult<()> {
        let mut params = Vec::new();
        if self.peek() == Some(&Token::LParen) {
            self.advance();
            if self.peek() != Some(&Token::RParen) {
                loop {
                    params.push(self.parse_expr()?);
                    if self.peek() == Some(&Token::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
            }
            self.expect(&Token::RParen)?;
        }

        let mut qubits = self.parse_qubit_ref()?;
        while self.peek() == Some(&Token::Comma) {
            self.advance();
            qubits.extend(self.parse_qubit_ref()?);
        }
        self.expect(&Token::Semicolon)?;
        self.instructions.push(Instruction::gate(name, qubits, params));
        Ok(())
    }

    /// A minimal arithmetic expression over `pi`, numeric literals, and
    /// `+ - * /` — exactly what gate angle parameters use in practice.
    fn parse_expr(&mut self) -> ParseResult<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> ParseResult<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    value /= self.parse_factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> ParseResult<f64> {
        match self.advance() {
            Some(Token::Minus) => Ok(-self.parse_factor()?),
            Some(Token::FloatLiteral(v)) => Ok(v),
            Some(Token::IntLiteral(v)) => Ok(v as f64),
            Some(Token::Pi) => Ok(std::f64::consts::PI),
            Some(Token::LParen) => {
                let v = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(v)
            }
            Some(t) => Err(ParseError::UnexpectedToken {
                expected: "numeric expression".to_string(),
                found: t.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("expected expression".to_string())),
        }
    }

    /// A register reference, optionally indexed: `q` (whole register) or
    /// `q[2]` (a single qubit).
    fn parse_qubit_ref(&mut self) -> ParseResult<Vec<QubitId>> {
        let name = self.expect_identifier()?;
        let reg = *self
            .qregs
            .get(&name)
            .ok_or_else(|| ParseError::UndefinedRegister(name.clone()))?;
        if self.peek() == Some(&Token::LBracket) {
            self.advance();
            let idx = self.expect_int()?;
            self.expect(&Token::RBracket)?;
            if idx >= reg.len {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index: idx,
                    size: reg.len,
                });
            }
            Ok(vec![QubitId(reg.start + idx)])
        } else {
            Ok((0..reg.len).map(|i| QubitId(reg.start + i)).collect())
        }
    }

    fn parse_clbit_ref(&mut self) -> ParseResult<Vec<ClbitId>> {
        let name = self.expect_identifier()?;
        let reg = *self
            .cregs
            .get(&name)
            .ok_or_else(|| ParseError::UndefinedRegister(name.clone()))?;
        if self.peek() == Some(&Token::LBracket) {
            self.advance();
            let idx = self.expect_int()?;
            self.expect(&Token::RBracket)?;
            if idx >= reg.len {
                return Err(ParseError::IndexOutOfBounds {
                    register: name,
                    index: idx,
                    size: reg.len,
                });
            }
            Ok(vec![ClbitId(reg.start + idx)])
        } else {
            Ok((0..reg.len).map(|i| ClbitId(reg.start + i)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bell_pair_qasm2() {
        let src = r#"OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q -> c;
"#;
        let circuit = parse(src).unwrap();
        assert_eq!(circuit.num_qubits, 2);
        assert_eq!(circuit.num_clbits, 2);
        assert_eq!(circuit.instructions.len(), 4);
        assert_eq!(circuit.measured_clbits(), 2);
    }

    #[test]
    fn parses_qasm3_declarations_and_assignment_measure() {
        let src = r#"OPENQASM 3.0;
qubit[2] q;
bit[2] c;
h q[0];
cx q[0], q[1];
c = measure q;
"#;
        let circuit = parse(src).unwrap();
        assert_eq!(circuit.num_qubits, 2);
        assert_eq!(circuit.measured_clbits(), 2);
    }

    #[test]
    fn parses_parameterized_gate() {
        let src = "OPENQASM 2.0;\nqreg q[1];\nrx(pi/2) q[0];\n";
        let circuit = parse(src).unwrap();
        match &circuit.instructions[0].kind {
            InstructionKind::Gate { name, params } => {
                assert_eq!(name, "rx");
                assert!((params[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
            }
            other => panic!("expected gate, got {other:?}"),
        }
    }

    #[test]
    fn rejects_undefined_register() {
        let src = "OPENQASM 2.0;\nh q[0];\n";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ParseError::UndefinedRegister(_)));
    }

    #[test]
    fn rejects_out_of_bounds_index() {
        let src = "OPENQASM 2.0;\nqreg q[2];\nh q[5];\n";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfBounds { .. }));
    }
}
