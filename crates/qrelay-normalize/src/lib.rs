//! Canonical hex/binary/decimal measurement-key normalization (spec §4.4).
//!
//! Grounded directly on `base_pilot.py`'s static methods — the four
//! functions below are named and behave identically, so a result produced
//! by any pilot in this workspace agrees on key format regardless of what
//! the provider's own SDK returned.

use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("could not parse '{0}' as a binary register string")]
    InvalidBinary(String),

    #[error("could not parse '{0}' as a hex register string")]
    InvalidHex(String),

    #[error("register widths {registers:?} sum to {sum} but key '{key}' needs at least {needed} bits")]
    RegisterWidthMismatch {
        registers: Vec<usize>,
        sum: usize,
        key: String,
        needed: usize,
    },

    #[error("key '{key}' has {found} space-separated registers but {expected} widths were given")]
    RegisterCountMismatch { key: String, expected: usize, found: usize },
}

/// `{3: 1234}` -> `{"0x3": 1234}`.
pub fn decimal_to_hex(counts: &FxHashMap<u64, u64>) -> FxHashMap<String, u64> {
    counts
        .iter()
        .map(|(k, v)| (format!("0x{k:x}"), *v))
        .collect()
}

/// `{"010 1": 1234}` -> `{"0x2 0x1": 1234}`.
///
/// Splits each key on whitespace into registers, each parsed as binary and
/// re-emitted as `0x`-prefixed lowercase hex, registers rejoined with a
/// single space in their original (most-significant-register-first) order.
pub fn binary_to_hex(
    counts: &FxHashMap<String, u64>,
    reverse_qubit_order: bool,
) -> Result<FxHashMap<String, u64>, NormalizeError> {
    let mut result = FxHashMap::default();
    for (bitstring, v) in counts {
        let mut hex_registers = Vec::new();
        for reg in bitstring.split_whitespace() {
            let reg_bits: String = if reverse_qubit_order {
                reg.chars().rev().collect()
            } else {
                reg.to_string()
            };
            let value = u64::from_str_radix(&reg_bits, 2)
                .map_err(|_| NormalizeError::InvalidBinary(bitstring.clone()))?;
            hex_registers.push(format!("0x{value:x}"));
        }
        result.insert(hex_registers.join(" "), *v);
    }
    Ok(result)
}

/// Exact inverse of [`binary_to_hex`]: `{"0x2 0x1": 1234}`, `registers: [3, 1]`
/// -> `{"010 1": 1234}`, each register zero-padded to its own
/// `registers[i]` width, same space-joined, most-significant-register-first
/// layout `binary_to_hex` produces.
pub fn hex_to_binary(
    counts: &FxHashMap<String, u64>,
    registers: &[usize],
    reverse_qubit_order: bool,
) -> Result<FxHashMap<String, u64>, NormalizeError> {
    let mut result = FxHashMap::default();

    for (hex_string, v) in counts {
        let hex_registers: Vec<&str> = hex_string.split_whitespace().collect();
        if hex_registers.len() != registers.len() {
            return Err(NormalizeError::RegisterCountMismatch {
                key: hex_string.clone(),
                expected: registers.len(),
                found: hex_registers.len(),
            });
        }

        let mut parts = Vec::with_capacity(registers.len());
        for (reg, &width) in hex_registers.iter().zip(registers) {
            let stripped = reg.trim_start_matches("0x");
            let value = u64::from_str_radix(stripped, 16)
                .map_err(|_| NormalizeError::InvalidHex(hex_string.clone()))?;
            let mut part = format!("{value:0width$b}", width = width);
            if part.len() > width {
                part = part[part.len() - width..].to_string();
            }
            if reverse_qubit_order {
                part = part.chars().rev().collect();
            }
            parts.push(part);
        }
        result.insert(parts.join(" "), *v);
    }
    Ok(result)
}

/// `probability = count / total`; `{"": 0.0}` when total is zero (spec
/// §4.4).
pub fn counts_to_probabilities(counts: &FxHashMap<String, u64>) -> FxHashMap<String, f64> {
    let total: u64 = counts.values().sum();
    if total == 0 {
        let mut zero = FxHashMap::default();
        zero.insert(String::new(), 0.0);
        return zero;
    }
    counts
        .iter()
        .map(|(k, v)| (k.clone(), *v as f64 / total as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_to_hex_matches_base_pilot_example() {
        let mut counts = FxHashMap::default();
        counts.insert(3, 1234);
        let hex = decimal_to_hex(&counts);
        assert_eq!(hex.get("0x3"), Some(&1234));
    }

    #[test]
    fn binary_to_hex_matches_base_pilot_example() {
        let mut counts = FxHashMap::default();
        counts.insert("010 1".to_string(), 1234);
        let hex = binary_to_hex(&counts, false).unwrap();
        assert_eq!(hex.get("0x2 0x1"), Some(&1234));
    }

    #[test]
    fn hex_to_binary_is_exact_inverse() {
        let mut counts = FxHashMap::default();
        counts.insert("0x2 0x1".to_string(), 1234);
        let binary = hex_to_binary(&counts, &[3, 1], false).unwrap();
        assert_eq!(binary.get("010 1"), Some(&1234));
    }

    #[test]
    fn reverse_qubit_order_flips_each_register() {
        let mut counts = FxHashMap::default();
        counts.insert("100".to_string(), 10);
        let hex = binary_to_hex(&counts, true).unwrap();
        // "100" reversed is "001" == 0x1
        assert_eq!(hex.get("0x1"), Some(&10));
    }

    #[test]
    fn probabilities_sum_to_one() {
        let mut counts = FxHashMap::default();
        counts.insert("0x0".to_string(), 2000);
        counts.insert("0x3".to_string(), 2000);
        let probs = counts_to_probabilities(&counts);
        let total: f64 = probs.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn probabilities_of_empty_counts_is_sentinel() {
        let counts = FxHashMap::default();
        let probs = counts_to_probabilities(&counts);
        assert_eq!(probs.get(""), Some(&0.0));
        assert_eq!(probs.len(), 1);
    }
}
