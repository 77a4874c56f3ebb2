// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topological batch planning.
//!
//! The planner turns a [`DeploymentGraph`] into an ordered sequence of
//! batches using Kahn's algorithm: nodes with in-degree zero form batch 0;
//! removing them and repeating forms subsequent batches. Nodes within one
//! batch have no edges between them and may be dispatched concurrently;
//! batch order respects every edge.
//!
//! ## Determinism
//!
//! Given the same graph, batch contents and the ordering of nodes within a
//! batch are identical across runs: ties are broken by declaration order.
//! The journal is keyed by node id, so this stability is what lets a resumed
//! run line up with the records of an interrupted one.
//!
//! ## Cycle detection
//!
//! If nodes remain with nonzero in-degree once no further batch can be
//! formed, the graph is cyclic and planning fails with
//! [`GraphError::CyclicDependency`] naming exactly the involved node ids —
//! before any network activity.

use crate::errors::GraphError;
use crate::graph::{DeploymentGraph, NodeId};
use std::collections::HashMap;

/// Ordered sequence of mutually independent execution batches.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    batches: Vec<Vec<NodeId>>,
}

impl ExecutionPlan {
    pub fn batches(&self) -> &[Vec<NodeId>] {
        &self.batches
    }

    pub fn node_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    /// Index of the batch containing the given node.
    pub fn batch_index(&self, node_id: &NodeId) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.contains(node_id))
    }
}

/// Layer the graph into execution batches, failing on cycles.
pub fn plan(graph: &DeploymentGraph) -> Result<ExecutionPlan, GraphError> {
    let reverse_deps = graph.build_reverse_dependencies();
    let mut in_degree: HashMap<&NodeId, usize> = reverse_deps
        .iter()
        .map(|(id, deps)| (id, deps.len()))
        .collect();

    // graph.nodes() is in declaration order, which makes every batch's
    // internal order the declaration order for free.
    let mut current: Vec<NodeId> = graph
        .nodes()
        .iter()
        .filter(|node| in_degree.get(&node.id).copied().unwrap_or(0) == 0)
        .map(|node| node.id.clone())
        .collect();

    let mut batches: Vec<Vec<NodeId>> = Vec::new();
    let mut processed = 0usize;

    while !current.is_empty() {
        let mut next: Vec<NodeId> = Vec::new();
        for node_id in &current {
            for dependent in graph.dependents(node_id) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(dependent.clone());
                    }
                }
            }
        }
        next.sort_by_key(|id| graph.node(id).map(|n| n.index).unwrap_or(usize::MAX));

        processed += current.len();
        batches.push(std::mem::replace(&mut current, next));
    }

    if processed != graph.len() {
        // Whatever still has unsatisfied dependencies is on (or downstream
        // of) a cycle.
        let mut node_ids: Vec<NodeId> = graph
            .nodes()
            .iter()
            .filter(|node| in_degree.get(&node.id).copied().unwrap_or(0) > 0)
            .map(|node| node.id.clone())
            .collect();
        node_ids.sort_by_key(|id| graph.node(id).map(|n| n.index).unwrap_or(usize::MAX));
        return Err(GraphError::CyclicDependency { node_ids });
    }

    Ok(ExecutionPlan { batches })
}
