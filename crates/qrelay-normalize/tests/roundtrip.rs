//! Property-based checks for spec §8 invariant 4 (hex/bin round-trip).

use proptest::prelude::*;
use qrelay_normalize::{binary_to_hex, hex_to_binary};
use rustc_hash::FxHashMap;

fn binary_string(widths: &[usize]) -> String {
    widths
        .iter()
        .map(|w| "1".repeat(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

proptest! {
    #[test]
    fn bin_to_hex_to_bin_is_identity(
        reg_widths in prop::collection::vec(1usize..5, 1..4),
        count in 0u64..10_000,
    ) {
        // Build a binary key whose registers are all-ones, of the generated widths.
        let key = binary_string(&reg_widths);
        let mut counts = FxHashMap::default();
        counts.insert(key.clone(), count);

        let hex = binary_to_hex(&counts, false).unwrap();
        let back = hex_to_binary(&hex, &reg_widths, false).unwrap();

        prop_assert_eq!(back.get(&key), Some(&count));
    }

    #[test]
    fn reverse_order_round_trips_too(
        reg_widths in prop::collection::vec(1usize..5, 1..4),
        count in 0u64..10_000,
    ) {
        let key = binary_string(&reg_widths);
        let mut counts = FxHashMap::default();
        counts.insert(key.clone(), count);

        let hex = binary_to_hex(&counts, true).unwrap();
        let back = hex_to_binary(&hex, &reg_widths, true).unwrap();

        prop_assert_eq!(back.get(&key), Some(&count));
    }
}
