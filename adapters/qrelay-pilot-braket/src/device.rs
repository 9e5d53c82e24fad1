//! Device ARN to capability-preset mapping.
//!
//! Maps known Braket device ARNs to a qubit count and simulator flag.
//! Falls back to dynamic construction from device info for unknown devices.

// ──────────────────────────────────────────────────────────────────────
// Known device ARNs
// ──────────────────────────────────────────────────────────────────────

/// Rigetti Ankaa-3 (84 qubits, superconducting).
pub const RIGETTI_ANKAA_3: &str = "arn:aws:braket:us-west-1::device/qpu/rigetti/Ankaa-3";

/// IonQ Aria (25 qubits, trapped-ion).
pub const IONQ_ARIA: &str = "arn:aws:braket:us-east-1::device/qpu/ionq/Aria-1";

/// IonQ Aria 2 (25 qubits, trapped-ion).
pub const IONQ_ARIA_2: &str = "arn:aws:braket:us-east-1::device/qpu/ionq/Aria-2";

/// IonQ Forte (36 qubits, trapped-ion).
pub const IONQ_FORTE: &str = "arn:aws:braket:us-east-1::device/qpu/ionq/Forte-1";

/// IQM Garnet (20 qubits, superconducting).
pub const IQM_GARNET: &str = "arn:aws:braket:eu-north-1::device/qpu/iqm/Garnet";

/// SV1 state vector simulator.
pub const SV1: &str = "arn:aws:braket:::device/quantum-simulator/amazon/sv1";

/// TN1 tensor network simulator.
pub const TN1: &str = "arn:aws:braket:::device/quantum-simulator/amazon/tn1";

/// DM1 density matrix simulator.
pub const DM1: &str = "arn:aws:braket:::device/quantum-simulator/amazon/dm1";

// ──────────────────────────────────────────────────────────────────────
// Preset device metadata
// ──────────────────────────────────────────────────────────────────────

/// Qubit count and simulator flag for a known device ARN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevicePreset {
    pub num_qubits: u32,
    pub is_simulator: bool,
}

/// All known devices this pilot registers eagerly during device sync,
/// since the Braket SDK this workspace depends on has no list-devices
/// call — only `get_device` for a specific ARN.
pub const KNOWN_DEVICES: &[(&str, &str)] = &[
    ("rigetti-ankaa-3", RIGETTI_ANKAA_3),
    ("ionq-aria", IONQ_ARIA),
    ("ionq-aria-2", IONQ_ARIA_2),
    ("ionq-forte", IONQ_FORTE),
    ("iqm-garnet", IQM_GARNET),
    ("sv1", SV1),
    ("tn1", TN1),
    ("dm1", DM1),
];

/// Get the preset qubit count/simulator flag for a known Braket device ARN.
///
/// Returns `None` for unknown devices — caller should fall back to
/// dynamic discovery via the Braket API.
pub fn preset_for_device(device_arn: &str) -> Option<DevicePreset> {
    match device_arn {
        RIGETTI_ANKAA_3 => Some(DevicePreset {
            num_qubits: 84,
            is_simulator: false,
        }),
        IONQ_ARIA | IONQ_ARIA_2 => Some(DevicePreset {
            num_qubits: 25,
            is_simulator: false,
        }),
        IONQ_FORTE => Some(DevicePreset {
            num_qubits: 36,
            is_simulator: false,
        }),
        IQM_GARNET => Some(DevicePreset {
            num_qubits: 20,
            is_simulator: false,
        }),
        SV1 => Some(DevicePreset {
            num_qubits: 34,
            is_simulator: true,
        }),
        TN1 => Some(DevicePreset {
            num_qubits: 50,
            is_simulator: true,
        }),
        DM1 => Some(DevicePreset {
            num_qubits: 17,
            is_simulator: true,
        }),
        _ => None,
    }
}

/// Map a friendly device name to its ARN.
pub fn arn_for_name(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "rigetti" | "ankaa" | "ankaa-3" | "ankaa3" => Some(RIGETTI_ANKAA_3),
        "ionq" | "aria" | "aria-1" => Some(IONQ_ARIA),
        "aria-2" => Some(IONQ_ARIA_2),
        "forte" | "forte-1" => Some(IONQ_FORTE),
        "iqm-garnet" => Some(IQM_GARNET),
        "sv1" | "braket-sv1" => Some(SV1),
        "tn1" | "braket-tn1" => Some(TN1),
        "dm1" | "braket-dm1" => Some(DM1),
        _ => None,
    }
}

/// Extract provider name from a device ARN.
pub fn provider_from_arn(device_arn: &str) -> &str {
    // ARN format: arn:aws:braket:<region>::device/<type>/<provider>/<device>
    device_arn.split('/').nth(2).unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_device_preset() {
        let preset = preset_for_device(RIGETTI_ANKAA_3).unwrap();
        assert_eq!(preset.num_qubits, 84);
        assert!(!preset.is_simulator);
    }

    #[test]
    fn test_ionq_preset() {
        let preset = preset_for_device(IONQ_ARIA).unwrap();
        assert_eq!(preset.num_qubits, 25);
        assert!(!preset.is_simulator);
    }

    #[test]
    fn test_simulator_preset() {
        let preset = preset_for_device(SV1).unwrap();
        assert!(preset.is_simulator);
        assert_eq!(preset.num_qubits, 34);
    }

    #[test]
    fn test_unknown_device() {
        assert!(preset_for_device("arn:aws:braket:::device/qpu/unknown/foo").is_none());
    }

    #[test]
    fn test_arn_for_name() {
        assert_eq!(arn_for_name("rigetti"), Some(RIGETTI_ANKAA_3));
        assert_eq!(arn_for_name("sv1"), Some(SV1));
        assert_eq!(arn_for_name("ionq"), Some(IONQ_ARIA));
        assert!(arn_for_name("nonexistent").is_none());
    }

    #[test]
    fn test_provider_from_arn() {
        assert_eq!(provider_from_arn(RIGETTI_ANKAA_3), "rigetti");
        assert_eq!(provider_from_arn(IONQ_ARIA), "ionq");
        assert_eq!(provider_from_arn(SV1), "amazon");
    }
}
