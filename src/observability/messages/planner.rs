// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph construction and planning events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Batch layering completed for a graph.
///
/// # Example
/// ```
/// use kindling::observability::messages::planner::PlanComputed;
///
/// let msg = PlanComputed {
///     batch_count: 3,
///     node_count: 6,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PlanComputed {
    pub batch_count: usize,
    pub node_count: usize,
}

impl Display for PlanComputed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Computed {} batches for {} nodes",
            self.batch_count, self.node_count
        )
    }
}

impl StructuredLog for PlanComputed {
    fn log(&self) {
        tracing::info!(
            batch_count = self.batch_count,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "plan_computed",
            span_name = name,
            batch_count = self.batch_count,
            node_count = self.node_count,
        )
    }
}

/// Graph construction or planning rejected the module.
pub struct PlanningFailed<'a> {
    pub module: &'a str,
    pub reason: &'a str,
}

impl Display for PlanningFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Planning failed for module '{}': {}",
            self.module, self.reason
        )
    }
}

impl StructuredLog for PlanningFailed<'_> {
    fn log(&self) {
        tracing::error!(
            module = self.module,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "planning_failed",
            span_name = name,
            module = self.module,
            reason = self.reason,
        )
    }
}
