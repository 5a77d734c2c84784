// src/dag/graph.rs

//! Adjacency view over a project's relations.
//!
//! Nodes are task handles and each node keeps both its incoming and
//! outgoing edges. A parallel petgraph `DiGraphMap` mirrors the reachability
//! structure (parallel edges collapsed) for cycle checks.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::errors::RecomputeError;
use crate::model::TaskRelation;
use crate::types::{RelationId, RelationType, TaskId};

/// One end of a relation as seen from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub relation: RelationId,
    /// The task at the other end of the relation.
    pub task: TaskId,
    pub relation_type: RelationType,
    pub lag: i64,
}

/// Internal node structure: immediate predecessors and successors.
#[derive(Debug, Clone, Default)]
struct DagNode {
    incoming: Vec<Edge>,
    outgoing: Vec<Edge>,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<TaskId, DagNode>,
    /// Edge multiplicity per (predecessor, successor) pair.
    reach: DiGraphMap<TaskId, usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the view from existing relations. No acyclicity check is made;
    /// use [`ensure_acyclic`](Self::ensure_acyclic) for that.
    pub fn from_relations<'r>(relations: impl IntoIterator<Item = &'r TaskRelation>) -> Self {
        let mut graph = Self::new();
        for rel in relations {
            graph.add_relation(rel);
        }
        graph
    }

    pub fn add_relation(&mut self, rel: &TaskRelation) {
        self.nodes
            .entry(rel.predecessor_id)
            .or_default()
            .outgoing
            .push(Edge {
                relation: rel.id,
                task: rel.successor_id,
                relation_type: rel.relation_type,
                lag: rel.lag,
            });
        self.nodes
            .entry(rel.successor_id)
            .or_default()
            .incoming
            .push(Edge {
                relation: rel.id,
                task: rel.predecessor_id,
                relation_type: rel.relation_type,
                lag: rel.lag,
            });

        let count = self
            .reach
            .edge_weight(rel.predecessor_id, rel.successor_id)
            .copied()
            .unwrap_or(0);
        self.reach
            .add_edge(rel.predecessor_id, rel.successor_id, count + 1);
    }

    pub fn remove_relation(&mut self, rel: &TaskRelation) {
        for (id, outgoing) in [(rel.predecessor_id, true), (rel.successor_id, false)] {
            let now_empty = match self.nodes.get_mut(&id) {
                Some(node) => {
                    let list = if outgoing {
                        &mut node.outgoing
                    } else {
                        &mut node.incoming
                    };
                    list.retain(|e| e.relation != rel.id);
                    node.incoming.is_empty() && node.outgoing.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.nodes.remove(&id);
                self.reach.remove_node(id);
            }
        }

        if let Some(count) = self
            .reach
            .edge_weight(rel.predecessor_id, rel.successor_id)
            .copied()
        {
            if count <= 1 {
                self.reach.remove_edge(rel.predecessor_id, rel.successor_id);
            } else {
                self.reach
                    .add_edge(rel.predecessor_id, rel.successor_id, count - 1);
            }
        }
    }

    /// Tasks touched by at least one relation, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.nodes.contains_key(&task)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Incoming edges of `task` (the `edge.task` is the predecessor).
    pub fn predecessors_of(&self, task: TaskId) -> &[Edge] {
        self.nodes
            .get(&task)
            .map(|n| n.incoming.as_slice())
            .unwrap_or(&[])
    }

    /// Outgoing edges of `task` (the `edge.task` is the successor).
    pub fn successors_of(&self, task: TaskId) -> &[Edge] {
        self.nodes
            .get(&task)
            .map(|n| n.outgoing.as_slice())
            .unwrap_or(&[])
    }

    /// Whether adding `predecessor -> successor` would close a cycle.
    ///
    /// Self-loops are answered without traversal. Otherwise this is a
    /// depth-first reachability check from `successor` to `predecessor`.
    pub fn would_create_cycle(&self, predecessor: TaskId, successor: TaskId) -> bool {
        if predecessor == successor {
            return true;
        }
        if !self.reach.contains_node(predecessor) || !self.reach.contains_node(successor) {
            return false;
        }
        has_path_connecting(&self.reach, successor, predecessor, None)
    }

    /// Fails with `GraphNotAcyclic` if the current relations contain a cycle.
    pub fn ensure_acyclic(&self) -> Result<(), RecomputeError> {
        match toposort(&self.reach, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let task = cycle.node_id();
                warn!(%task, "dependency graph contains a cycle");
                Err(RecomputeError::GraphNotAcyclic { task })
            }
        }
    }

    /// Kahn's algorithm over the graph's tasks. Among ready tasks the one
    /// with the smallest `key` goes first, then the smallest id.
    pub fn topological_order<K, F>(&self, key: F) -> Result<Vec<TaskId>, RecomputeError>
    where
        K: Ord,
        F: Fn(TaskId) -> K,
    {
        let mut in_degree: BTreeMap<TaskId, usize> = self
            .nodes
            .iter()
            .map(|(id, node)| (*id, node.incoming.len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<(K, TaskId)>> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| Reverse((key(*id), *id)))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse((_, id))) = ready.pop() {
            order.push(id);
            for edge in self.successors_of(id) {
                if let Some(deg) = in_degree.get_mut(&edge.task) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(Reverse((key(edge.task), edge.task)));
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let task = in_degree
                .iter()
                .find(|(_, deg)| **deg > 0)
                .map(|(id, _)| *id)
                .unwrap_or(TaskId(0));
            warn!(%task, "topological order incomplete; graph has a cycle");
            return Err(RecomputeError::GraphNotAcyclic { task });
        }

        debug!(tasks = order.len(), "topological order computed");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(id: u64, p: u64, s: u64) -> TaskRelation {
        TaskRelation {
            id: RelationId(id),
            predecessor_id: TaskId(p),
            successor_id: TaskId(s),
            relation_type: RelationType::FinishToStart,
            lag: 0,
        }
    }

    #[test]
    fn detects_cycle_closing_edge() {
        let graph = DependencyGraph::from_relations(&[rel(1, 1, 2), rel(2, 2, 3)]);
        assert!(graph.would_create_cycle(TaskId(3), TaskId(1)));
        assert!(graph.would_create_cycle(TaskId(2), TaskId(1)));
        assert!(!graph.would_create_cycle(TaskId(1), TaskId(3)));
        assert!(!graph.would_create_cycle(TaskId(4), TaskId(1)));
        assert!(graph.would_create_cycle(TaskId(4), TaskId(4)));
    }

    #[test]
    fn topological_order_breaks_ties_by_key() {
        // 10 -> 30, 20 -> 30; keys reverse the id order.
        let graph = DependencyGraph::from_relations(&[rel(1, 10, 30), rel(2, 20, 30)]);
        let order = graph
            .topological_order(|id| std::cmp::Reverse(id.0))
            .unwrap();
        assert_eq!(order, vec![TaskId(20), TaskId(10), TaskId(30)]);

        let order = graph.topological_order(|id| id.0).unwrap();
        assert_eq!(order, vec![TaskId(10), TaskId(20), TaskId(30)]);
    }

    #[test]
    fn cyclic_graph_is_reported() {
        let graph = DependencyGraph::from_relations(&[rel(1, 1, 2), rel(2, 2, 1)]);
        assert!(matches!(
            graph.ensure_acyclic(),
            Err(RecomputeError::GraphNotAcyclic { .. })
        ));
        assert!(matches!(
            graph.topological_order(|id| id),
            Err(RecomputeError::GraphNotAcyclic { .. })
        ));
    }

    #[test]
    fn removing_parallel_edge_keeps_reachability() {
        let a = rel(1, 1, 2);
        let mut b = rel(2, 1, 2);
        b.relation_type = RelationType::StartToStart;
        let mut graph = DependencyGraph::from_relations(&[a, b]);

        graph.remove_relation(&a);
        assert!(graph.would_create_cycle(TaskId(2), TaskId(1)));
        assert_eq!(graph.successors_of(TaskId(1)).len(), 1);

        graph.remove_relation(&b);
        assert!(!graph.would_create_cycle(TaskId(2), TaskId(1)));
        assert!(graph.is_empty());
    }
}
