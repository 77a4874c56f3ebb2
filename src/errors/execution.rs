// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced by the execution engine.
//!
//! Execution errors never invalidate the journal: every Confirmed record
//! written before the error remains valid, and re-invoking the engine with
//! the same module and journal resumes from where the failed run stopped.

use crate::graph::NodeId;
use crate::journal::JournalError;
use crate::network::NetworkError;
use thiserror::Error;

/// A node that failed during a run, with the recorded reason.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFailure {
    pub node_id: NodeId,
    pub error: String,
}

impl std::fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node_id, self.error)
    }
}

/// Errors raised while executing a planned deployment.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// A node's dependency is not Confirmed at execution time. The planner
    /// guarantees ordering, not success, so this fires when a dependency
    /// failed or its record is missing.
    #[error("unresolved dependency: node '{node_id}' requires '{dependency}' which is not confirmed")]
    UnresolvedDependency {
        node_id: NodeId,
        dependency: String,
    },

    /// One or more nodes in a batch ended Failed; later batches were not
    /// started. `unresolved` lists the planned nodes withheld because they
    /// depend (transitively) on a failed node.
    #[error("deployment failed: {} node(s) failed, {} withheld", failed.len(), unresolved.len())]
    DeploymentFailed {
        failed: Vec<NodeFailure>,
        unresolved: Vec<NodeFailure>,
    },

    /// Confirmation waits elapsed for these nodes. Their records remain
    /// Submitted, not Failed, so a resume re-queries the network instead of
    /// double-submitting.
    #[error("confirmation timed out for node(s): {}", node_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", "))]
    ConfirmationTimeout { node_ids: Vec<NodeId> },

    /// The journal shows a node as Submitted but holds no transaction handle
    /// to re-query. The transaction may or may not be on chain; re-submitting
    /// blindly could double-deploy, so the engine refuses.
    #[error("ambiguous state: node '{node_id}' is submitted with no recorded transaction handle")]
    AmbiguousState { node_id: NodeId },

    /// The caller cancelled the run. No new nodes were submitted after the
    /// cancellation; in-flight transactions were awaited and journaled.
    #[error("deployment cancelled by caller")]
    Cancelled,

    /// A deploy node's artifact disappeared between graph construction and
    /// execution.
    #[error("artifact error: {0}")]
    Artifact(#[from] crate::artifacts::ArtifactError),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    /// Internal consistency error (task join failure and the like).
    #[error("internal error: {0}")]
    Internal(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}
