//! Property-based checks for spec §8 invariants 1 and 3.

use proptest::prelude::*;
use qrelay_domain::{FormatId, Instruction, PreparedCircuit, QubitId};
use qrelay_transpile::TranspileGraph;

fn arbitrary_circuit() -> impl Strategy<Value = PreparedCircuit> {
    (1u32..8, 0u32..20).prop_map(|(num_qubits, num_gates)| {
        let mut circuit = PreparedCircuit::new(num_qubits, num_qubits);
        for i in 0..num_gates {
            let q = i % num_qubits;
            circuit.push(Instruction::gate("h", vec![QubitId(q)], vec![]));
        }
        circuit
    })
}

fn full_graph() -> TranspileGraph {
    let mut graph = TranspileGraph::new();
    for src in FormatId::ALL {
        for dst in FormatId::ALL {
            if src != dst {
                graph.register_edge(src, dst, Ok);
            }
        }
    }
    graph
}

proptest! {
    #[test]
    fn idempotence_on_self_target(circuit in arbitrary_circuit(), format_idx in 0usize..FormatId::ALL.len()) {
        let graph = full_graph();
        let format = FormatId::ALL[format_idx];
        let plan = graph.plan(format, &[format]).unwrap();
        prop_assert!(plan.is_empty());
        let compiled = plan.compile(circuit.clone()).unwrap();
        prop_assert_eq!(compiled, circuit);
    }
}

#[test]
fn candidate_order_breaks_distance_ties() {
    let graph = full_graph();
    let forward = graph
        .plan(FormatId::DslA, &[FormatId::Qasm3, FormatId::Qasm2])
        .unwrap();
    assert_eq!(forward.target, FormatId::Qasm3);

    let reversed = graph
        .plan(FormatId::DslA, &[FormatId::Qasm2, FormatId::Qasm3])
        .unwrap();
    assert_eq!(reversed.target, FormatId::Qasm2);
}
