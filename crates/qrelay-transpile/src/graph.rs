//! The transpiler graph: a labelled directed multigraph over [`FormatId`]
//! nodes, built on `petgraph::graph::DiGraph` plus an `FxHashMap` node
//! index — the same pattern the teacher's job-dependency DAG uses.

use std::collections::VecDeque;
use std::sync::Arc;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use qrelay_domain::{FormatId, PreparedCircuit};
use rustc_hash::FxHashMap;

use crate::error::TranspileError;

pub type EdgeFn = Arc<dyn Fn(PreparedCircuit) -> Result<PreparedCircuit, TranspileError> + Send + Sync>;

/// One edge of a resolved plan: which conversion to run and between which
/// two formats, so a failure can be tagged with the failing edge (spec
/// §4.2's edge-case requirement).
#[derive(Clone)]
struct Edge {
    from: FormatId,
    to: FormatId,
    convert: EdgeFn,
}

/// A resolved, ordered sequence of edges from a source format to one of the
/// candidate targets passed to [`TranspileGraph::plan`].
#[derive(Clone)]
pub struct Plan {
    pub target: FormatId,
    edges: Vec<Edge>,
}

impl Plan {
    /// Left-folds each edge's conversion function over the input — the
    /// identity function when the plan is empty (same-format input).
    pub fn compile(&self, mut circuit: PreparedCircuit) -> Result<PreparedCircuit, TranspileError> {
        for edge in &self.edges {
            circuit = (edge.convert)(circuit).map_err(|_| TranspileError::EdgeFailed {
                from: edge.from,
                to: edge.to,
                message: "conversion function failed".to_string(),
            })?;
        }
        Ok(circuit)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Default)]
pub struct TranspileGraph {
    graph: DiGraph<FormatId, EdgeFn>,
    index: FxHashMap<FormatId, NodeIndex>,
}

impl TranspileGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: FxHashMap::default(),
        }
    }

    fn node(&mut self, format: FormatId) -> NodeIndex {
        *self
            .index
            .entry(format)
            .or_insert_with(|| self.graph.add_node(format))
    }

    /// Registers `src -> dst`, replacing any existing edge for the same
    /// `(src, dst)` pair (spec §4.2: "idempotent per triple; duplicate
    /// registration replaces").
    pub fn register_edge<F>(&mut self, src: FormatId, dst: FormatId, convert: F)
    where
        F: Fn(PreparedCircuit) -> Result<PreparedCircuit, TranspileError> + Send + Sync + 'static,
    {
        let src_idx = self.node(src);
        let dst_idx = self.node(dst);

        let existing: Vec<EdgeIndex> = self
            .graph
            .edges_connecting(src_idx, dst_idx)
            .map(|e| e.id())
            .collect();
        for edge_id in existing {
            self.graph.remove_edge(edge_id);
        }

        self.graph.add_edge(src_idx, dst_idx, Arc::new(convert));
    }

    /// Shortest path from `src` to any of `candidates`, ties broken by the
    /// candidate's position in the input list (spec §8 invariant 3).
    ///
    /// All edges have unit weight, so this is a breadth-first search with
    /// predecessor tracking rather than a general-purpose Dijkstra.
    pub fn plan(&self, src: FormatId, candidates: &[FormatId]) -> Result<Plan, TranspileError> {
        let Some(&src_idx) = self.index.get(&src) else {
            return Err(TranspileError::NoPath {
                from: src,
                to: candidates.to_vec(),
            });
        };

        let mut distance: FxHashMap<NodeIndex, u32> = FxHashMap::default();
        let mut predecessor: FxHashMap<NodeIndex, (NodeIndex, EdgeIndex)> = FxHashMap::default();
        distance.insert(src_idx, 0);
        let mut queue = VecDeque::new();
        queue.push_back(src_idx);

        while let Some(current) = queue.pop_front() {
            let d = distance[&current];
            for edge in self.graph.edges_directed(current, Direction::Outgoing) {
                let next = edge.target();
                if !distance.contains_key(&next) {
                    distance.insert(next, d + 1);
                    predecessor.insert(next, (current, edge.id()));
                    queue.push_back(next);
                }
            }
        }

        let best = candidates
            .iter()
            .filter_map(|c| {
                self.index
                    .get(c)
                    .and_then(|idx| distance.get(idx).map(|d| (*c, *idx, *d)))
            })
            .min_by_key(|(_, _, d)| *d);

        let Some((target, target_idx, _)) = best else {
            return Err(TranspileError::NoPath {
                from: src,
                to: candidates.to_vec(),
            });
        };

        let mut edge_ids = Vec::new();
        let mut cursor = target_idx;
        while cursor != src_idx {
            let (prev, edge_id) = predecessor[&cursor];
            edge_ids.push(edge_id);
            cursor = prev;
        }
        edge_ids.reverse();

        let edges = edge_ids
            .into_iter()
            .map(|edge_id| {
                let (from_idx, to_idx) = self.graph.edge_endpoints(edge_id).expect("edge exists");
                Edge {
                    from: self.graph[from_idx],
                    to: self.graph[to_idx],
                    convert: self.graph[edge_id].clone(),
                }
            })
            .collect();

        Ok(Plan { target, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(c: PreparedCircuit) -> Result<PreparedCircuit, TranspileError> {
        Ok(c)
    }

    #[test]
    fn same_format_plan_is_empty() {
        let mut graph = TranspileGraph::new();
        graph.register_edge(FormatId::Qasm2, FormatId::Qasm3, identity);
        let plan = graph.plan(FormatId::Qasm2, &[FormatId::Qasm2]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.target, FormatId::Qasm2);
    }

    #[test]
    fn picks_shortest_of_several_candidates() {
        let mut graph = TranspileGraph::new();
        graph.register_edge(FormatId::DslA, FormatId::Qasm3, identity);
        graph.register_edge(FormatId::Qasm3, FormatId::Qasm2, identity);
        // DslA -> Qasm2 is reachable in 1 hop via a direct edge, and in 2 via Qasm3.
        graph.register_edge(FormatId::DslA, FormatId::Qasm2, identity);

        let plan = graph
            .plan(FormatId::DslA, &[FormatId::Qasm3, FormatId::Qasm2])
            .unwrap();
        assert_eq!(plan.target, FormatId::Qasm2);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn ties_break_by_candidate_list_order() {
        let mut graph = TranspileGraph::new();
        graph.register_edge(FormatId::DslA, FormatId::Qasm2, identity);
        graph.register_edge(FormatId::DslA, FormatId::Qasm3, identity);

        let plan = graph
            .plan(FormatId::DslA, &[FormatId::Qasm3, FormatId::Qasm2])
            .unwrap();
        assert_eq!(plan.target, FormatId::Qasm3);

        let plan = graph
            .plan(FormatId::DslA, &[FormatId::Qasm2, FormatId::Qasm3])
            .unwrap();
        assert_eq!(plan.target, FormatId::Qasm2);
    }

    #[test]
    fn unreachable_target_fails_with_no_path() {
        let mut graph = TranspileGraph::new();
        graph.register_edge(FormatId::DslA, FormatId::Qasm3, identity);
        let err = graph.plan(FormatId::DslA, &[FormatId::DslB]).unwrap_err();
        assert!(matches!(err, TranspileError::NoPath { .. }));
    }

    #[test]
    fn duplicate_registration_replaces_existing_edge() {
        let mut graph = TranspileGraph::new();
        graph.register_edge(FormatId::DslA, FormatId::Qasm3, |_| {
            Err(TranspileError::EdgeFailed {
                from: FormatId::DslA,
                to: FormatId::Qasm3,
                message: "first registration".to_string(),
            })
        });
        graph.register_edge(FormatId::DslA, FormatId::Qasm3, identity);

        let plan = graph.plan(FormatId::DslA, &[FormatId::Qasm3]).unwrap();
        let result = plan.compile(PreparedCircuit::new(1, 1));
        assert!(result.is_ok());
    }
}
