//! The closed enumeration of circuit source formats (spec §4.1).

use serde::{Deserialize, Serialize};

/// A tag identifying a circuit representation.
///
/// Closed on purpose: the registry and the transpiler graph both key off
/// this type, and adding a new wire format means adding a variant plus the
/// edges that reach it — never a runtime-registered string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum FormatId {
    /// `OpenQASM` 2.0 textual IR.
    Qasm2,
    /// `OpenQASM` 3.0 textual IR.
    Qasm3,
    /// Python-embedded DSL A (bounded structural subset, see crate docs).
    DslA,
    /// Python-embedded DSL B.
    DslB,
    /// Python-embedded DSL C.
    DslC,
    /// A quil-like textual IR.
    QuilText,
}

impl FormatId {
    pub const ALL: [FormatId; 6] = [
        FormatId::Qasm2,
        FormatId::Qasm3,
        FormatId::DslA,
        FormatId::DslB,
        FormatId::DslC,
        FormatId::QuilText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatId::Qasm2 => "qasm2",
            FormatId::Qasm3 => "qasm3",
            FormatId::DslA => "dsl_a",
            FormatId::DslB => "dsl_b",
            FormatId::DslC => "dsl_c",
            FormatId::QuilText => "quil_text",
        }
    }
}

impl std::fmt::Display for FormatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FormatId {
    type Err = crate::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| crate::error::DomainError::Validation(format!("unknown format: {s}")))
    }
}
