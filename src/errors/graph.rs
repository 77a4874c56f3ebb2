// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::NodeId;
use std::fmt;

/// Errors that can occur while constructing or planning the dependency graph.
///
/// All of these are fatal before any network activity: a module that fails
/// graph construction or planning never submits a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two deploy intents declare the same name
    DuplicateName {
        /// The duplicate declared name
        name: String,
    },
    /// An argument or call target references a name no intent declares
    DanglingReference {
        /// The node holding the reference
        node_id: NodeId,
        /// The name that could not be resolved
        missing: String,
    },
    /// A deploy intent references its own output
    SelfReference {
        /// The self-referencing node
        node_id: NodeId,
    },
    /// A deploy intent names a contract with no compiled output
    UnknownArtifact {
        /// The unresolvable contract name
        contract: String,
    },
    /// The graph contains at least one cycle
    CyclicDependency {
        /// The nodes left with unsatisfied dependencies after layering
        node_ids: Vec<NodeId>,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateName { name } => {
                write!(f, "Duplicate declared name: '{}'", name)
            }
            GraphError::DanglingReference { node_id, missing } => {
                write!(
                    f,
                    "Node '{}' references '{}' which is not declared in this module",
                    node_id, missing
                )
            }
            GraphError::SelfReference { node_id } => {
                write!(f, "Node '{}' references its own output", node_id)
            }
            GraphError::UnknownArtifact { contract } => {
                write!(
                    f,
                    "No compiled artifact exists for contract '{}'",
                    contract
                )
            }
            GraphError::CyclicDependency { node_ids } => {
                let ids: Vec<&str> = node_ids.iter().map(NodeId::as_str).collect();
                write!(f, "Cyclic dependency involving: {}", ids.join(", "))
            }
        }
    }
}

impl std::error::Error for GraphError {}
