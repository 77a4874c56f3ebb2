// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Core types for the deployment dependency graph.
//!
//! A [`DeploymentGraph`] holds the nodes of a module in declaration order plus
//! forward edges (producer -> consumers). Edges mean "the producer must be
//! confirmed before the consumer may run." Node ids are deterministic and
//! stable across re-runs of the same module, which is what lets the journal
//! line up with the plan when a run is resumed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Deterministic identifier for a deployment node.
///
/// Deploy nodes use `<module>#<name>`; call nodes use
/// `<module>#<target>.<method>`, with an ordinal suffix (`#2`, `#3`, ...)
/// when the same target/method pair is called more than once. The derivation
/// depends only on the module definition, never on execution state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A resolved argument on a graph node.
///
/// Module-level arguments reference other intents by declared name; the graph
/// builder rewrites those into [`NodeId`] references so the planner and the
/// engine never deal with raw names again.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeArg {
    /// A plain value passed through unchanged.
    Literal(serde_json::Value),
    /// The future address of another node's deployed contract.
    Node(NodeId),
    /// An externally funded account, by index into the run's account list.
    Account(usize),
}

/// What a node does when executed.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Deploy `contract` under the declared `name`.
    Deploy {
        name: String,
        contract: String,
        args: Vec<NodeArg>,
    },
    /// Invoke `method` on the contract deployed by `target`.
    Call {
        target: NodeId,
        method: String,
        args: Vec<NodeArg>,
    },
}

/// An atomic deployable or callable unit in the dependency graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Position in the module's declaration order. Used as the stable
    /// tie-break when the planner orders nodes inside a batch.
    pub index: usize,
    pub kind: NodeKind,
}

impl Node {
    /// Every node argument that references another node.
    pub fn node_refs(&self) -> Vec<&NodeId> {
        let (args, target) = match &self.kind {
            NodeKind::Deploy { args, .. } => (args, None),
            NodeKind::Call { args, target, .. } => (args, Some(target)),
        };
        let mut refs: Vec<&NodeId> = args
            .iter()
            .filter_map(|arg| match arg {
                NodeArg::Node(id) => Some(id),
                _ => None,
            })
            .collect();
        if let Some(target) = target {
            refs.push(target);
        }
        refs
    }
}

/// Set of nodes plus directed producer -> consumer edges.
///
/// Acyclicity is not enforced here; the planner rejects cyclic graphs before
/// any network activity.
#[derive(Debug, Clone)]
pub struct DeploymentGraph {
    nodes: Vec<Node>,
    edges: HashMap<NodeId, Vec<NodeId>>,
}

impl DeploymentGraph {
    pub fn new(nodes: Vec<Node>, edges: HashMap<NodeId, Vec<NodeId>>) -> Self {
        Self { nodes, edges }
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Consumers that depend on the given producer.
    pub fn dependents(&self, id: &NodeId) -> &[NodeId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All edges as (producer, consumer) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.edges
            .iter()
            .flat_map(|(producer, consumers)| consumers.iter().map(move |c| (producer, c)))
    }

    /// Build a consumer -> producers map for in-degree calculations.
    ///
    /// The graph stores forward edges (producer -> consumers); the planner
    /// needs to know, for each node, which nodes it depends on.
    pub fn build_reverse_dependencies(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut reverse: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in &self.nodes {
            reverse.entry(node.id.clone()).or_default();
        }
        for (producer, consumers) in &self.edges {
            for consumer in consumers {
                reverse
                    .entry(consumer.clone())
                    .or_default()
                    .push(producer.clone());
            }
        }
        reverse
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn deploy(id: &str, index: usize) -> Node {
        Node {
            id: NodeId::from(id),
            index,
            kind: NodeKind::Deploy {
                name: id.to_string(),
                contract: id.to_string(),
                args: vec![],
            },
        }
    }

    #[test]
    fn reverse_dependencies_invert_forward_edges() {
        let nodes = vec![deploy("M#A", 0), deploy("M#B", 1)];
        let mut edges = HashMap::new();
        edges.insert(NodeId::from("M#A"), vec![NodeId::from("M#B")]);
        let graph = DeploymentGraph::new(nodes, edges);

        let reverse = graph.build_reverse_dependencies();
        assert_eq!(reverse[&NodeId::from("M#B")], vec![NodeId::from("M#A")]);
        assert!(reverse[&NodeId::from("M#A")].is_empty());
    }

}
