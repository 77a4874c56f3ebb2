// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for deployment run lifecycle and per-node events.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, resume, completion, failure)
//! * Per-node dispatch, confirmation, and failure
//! * Batch progression

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A deployment run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use kindling::observability::messages::engine::DeploymentStarted;
///
/// let msg = DeploymentStarted {
///     module: "MizuPass",
///     node_count: 6,
///     batch_count: 3,
///     resumed_nodes: 0,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct DeploymentStarted<'a> {
    pub module: &'a str,
    pub node_count: usize,
    pub batch_count: usize,
    /// Nodes already Confirmed in the journal when the run began.
    pub resumed_nodes: usize,
}

impl Display for DeploymentStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting deployment of module '{}': {} nodes in {} batches ({} already confirmed)",
            self.module, self.node_count, self.batch_count, self.resumed_nodes
        )
    }
}

impl StructuredLog for DeploymentStarted<'_> {
    fn log(&self) {
        tracing::info!(
            module = self.module,
            node_count = self.node_count,
            batch_count = self.batch_count,
            resumed_nodes = self.resumed_nodes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "deployment",
            span_name = name,
            module = self.module,
            node_count = self.node_count,
            batch_count = self.batch_count,
        )
    }
}

/// A batch of independent nodes is being dispatched.
pub struct BatchStarted {
    pub batch_index: usize,
    pub node_count: usize,
}

impl Display for BatchStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching batch {}: {} node(s)",
            self.batch_index, self.node_count
        )
    }
}

impl StructuredLog for BatchStarted {
    fn log(&self) {
        tracing::debug!(
            batch_index = self.batch_index,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "batch",
            span_name = name,
            batch_index = self.batch_index,
            node_count = self.node_count,
        )
    }
}

/// A node's transaction was handed to the network.
pub struct NodeSubmitted<'a> {
    pub node_id: &'a str,
    pub tx_handle: &'a str,
}

impl Display for NodeSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Submitted '{}' as {}", self.node_id, self.tx_handle)
    }
}

impl StructuredLog for NodeSubmitted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            tx_handle = self.tx_handle,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_submitted",
            span_name = name,
            node_id = self.node_id,
            tx_handle = self.tx_handle,
        )
    }
}

/// A node's receipt arrived with success.
///
/// # Example
/// ```
/// use kindling::observability::messages::engine::NodeConfirmed;
///
/// let msg = NodeConfirmed {
///     node_id: "MizuPass#EventRegistry",
///     address: Some("0x0000000000000000000000000000000000c0fff2"),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct NodeConfirmed<'a> {
    pub node_id: &'a str,
    /// Deployed address for deploy nodes, absent for calls.
    pub address: Option<&'a str>,
}

impl Display for NodeConfirmed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.address {
            Some(address) => write!(f, "Confirmed '{}' at {}", self.node_id, address),
            None => write!(f, "Confirmed '{}'", self.node_id),
        }
    }
}

impl StructuredLog for NodeConfirmed<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            address = self.address.unwrap_or(""),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "node_confirmed",
            span_name = name,
            node_id = self.node_id,
        )
    }
}

/// A node ended Failed: reverted, rejected, or withheld by a failed
/// dependency.
pub struct NodeFailed<'a> {
    pub node_id: &'a str,
    pub error: &'a str,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node_id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_failed",
            span_name = name,
            node_id = self.node_id,
            error = self.error,
        )
    }
}

/// A node was skipped because the journal already shows it Confirmed.
pub struct NodeSkipped<'a> {
    pub node_id: &'a str,
}

impl Display for NodeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping '{}': already confirmed", self.node_id)
    }
}

impl StructuredLog for NodeSkipped<'_> {
    fn log(&self) {
        tracing::debug!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("node_skipped", span_name = name, node_id = self.node_id)
    }
}

/// The whole run finished with every node Confirmed.
pub struct DeploymentCompleted<'a> {
    pub module: &'a str,
    pub deployed: usize,
    pub duration: std::time::Duration,
}

impl Display for DeploymentCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Deployment of module '{}' completed: {} contract(s) in {:?}",
            self.module, self.deployed, self.duration
        )
    }
}

impl StructuredLog for DeploymentCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            module = self.module,
            deployed = self.deployed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "deployment_completed",
            span_name = name,
            module = self.module,
            deployed = self.deployed,
        )
    }
}
