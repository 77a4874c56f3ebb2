// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deployment executor: walks the planned batches against the network.
//!
//! The executor dispatches every node in a batch concurrently (no ordering
//! dependencies exist inside a batch), waits for the whole batch's outcomes,
//! and only then advances — later batches may reference any node in the
//! batch, so the suspension points are exactly "await confirmation of batch
//! N". All state lives in the journal passed into the run; nothing is held
//! in ambient globals, so independent deployment runs coexist in one
//! process.
//!
//! ## Resume semantics
//!
//! The journal is consulted before every dispatch:
//! * `Confirmed` nodes are skipped outright — a rerun over a fully confirmed
//!   journal performs zero submissions.
//! * `Submitted` nodes carry the handle persisted before the original await;
//!   the executor re-queries the network by handle instead of re-submitting.
//!   A `Submitted` record without a handle is unresolvable ambiguity and
//!   aborts the run, because blind re-submission could double-deploy.
//! * `Failed` nodes are retried.
//!
//! ## Failure semantics
//!
//! A node that ends `Failed` stops the run at its batch boundary: confirmed
//! work stays valid in the journal, later batches are withheld, and the
//! returned error enumerates both the failed nodes and every planned node
//! withheld because a (transitive) dependency failed. A confirmation wait
//! that elapses leaves the record `Submitted` — deliberately not `Failed` —
//! so the next run re-queries rather than double-submits.

use crate::artifacts::ArtifactResolver;
use crate::errors::{ExecutionError, NodeFailure};
use crate::graph::{DeploymentGraph, Node, NodeArg, NodeId, NodeKind};
use crate::journal::{ExecutionRecord, ExecutionStatus, Journal};
use crate::network::{Address, Network, NetworkError, TxHandle, TxRequest};
use crate::observability::messages::engine::{
    BatchStarted, DeploymentCompleted, DeploymentStarted, NodeConfirmed, NodeFailed, NodeSkipped,
    NodeSubmitted,
};
use crate::observability::messages::StructuredLog;
use crate::planner::ExecutionPlan;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;

/// Final mapping of declared deploy names to their addresses.
pub type DeploymentResult = BTreeMap<String, Address>;

/// Knobs for a single deployment run.
pub struct RunOptions {
    /// Maximum concurrent dispatches within a batch.
    pub max_concurrency: usize,
    /// Bounded wait for each receipt. Elapsing leaves the node Submitted.
    pub confirmation_timeout: Duration,
    /// Once triggered, no new node is submitted; in-flight transactions are
    /// still awaited, since a broadcast cannot be recalled.
    pub cancellation: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        let concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            max_concurrency: concurrency,
            confirmation_timeout: Duration::from_secs(60),
            cancellation: CancellationToken::new(),
        }
    }
}

/// What to do for one node of the current batch.
enum Dispatch {
    /// Fresh submission with a fully resolved transaction.
    Submit { node: Node, request: TxRequest },
    /// Resume: a previous run submitted this node; re-query by handle.
    Requery { node: Node, handle: TxHandle },
}

/// Outcome of one node's task, after journaling.
enum NodeOutcome {
    Confirmed,
    Failed(NodeFailure),
    TimedOut(NodeId),
    /// The token fired before this node was submitted; its record stays
    /// Pending.
    Cancelled,
    NetworkFault(NetworkError),
    JournalFault(crate::journal::JournalError),
}

/// Executes a planned deployment against a network, journaling every state
/// transition.
pub struct DeploymentExecutor {
    network: Arc<dyn Network>,
    options: RunOptions,
}

impl DeploymentExecutor {
    pub fn new(network: Arc<dyn Network>) -> Self {
        Self::with_options(network, RunOptions::default())
    }

    pub fn with_options(network: Arc<dyn Network>, options: RunOptions) -> Self {
        Self { network, options }
    }

    /// Execute every node of the plan that is not already Confirmed.
    ///
    /// On full success returns the name -> address mapping of every deploy
    /// node. On failure the journal is left consistent for a future resume:
    /// Confirmed records are never touched, Failed records may be retried,
    /// and Submitted records keep the handle needed to re-query.
    pub async fn run<J>(
        &self,
        module: &str,
        graph: &DeploymentGraph,
        plan: &ExecutionPlan,
        artifacts: &dyn ArtifactResolver,
        accounts: &[Address],
        journal: J,
    ) -> Result<DeploymentResult, ExecutionError>
    where
        J: Journal + 'static,
    {
        let started = Instant::now();
        let journal = Arc::new(Mutex::new(journal));

        let resumed_nodes = self.seed_pending_records(graph, &journal).await?;
        DeploymentStarted {
            module,
            node_count: graph.len(),
            batch_count: plan.batches().len(),
            resumed_nodes,
        }
        .log();

        for (batch_index, batch) in plan.batches().iter().enumerate() {
            BatchStarted {
                batch_index,
                node_count: batch.len(),
            }
            .log();

            let (dispatches, mut failed, mut cancelled) = self
                .prepare_batch(batch, graph, artifacts, accounts, &journal)
                .await?;

            let outcomes = self.dispatch_batch(dispatches, &journal).await?;

            let mut timed_out: Vec<NodeId> = Vec::new();
            let mut network_fault: Option<NetworkError> = None;
            let mut journal_fault: Option<crate::journal::JournalError> = None;
            for outcome in outcomes {
                match outcome {
                    NodeOutcome::Confirmed => {}
                    NodeOutcome::Failed(failure) => failed.push(failure),
                    NodeOutcome::TimedOut(node_id) => timed_out.push(node_id),
                    NodeOutcome::Cancelled => cancelled = true,
                    NodeOutcome::NetworkFault(err) => network_fault = Some(err),
                    NodeOutcome::JournalFault(err) => journal_fault = Some(err),
                }
            }

            if let Some(err) = journal_fault {
                return Err(err.into());
            }
            if let Some(err) = network_fault {
                return Err(err.into());
            }
            if !failed.is_empty() {
                failed.sort_by_key(|f| graph.node(&f.node_id).map(|n| n.index).unwrap_or(usize::MAX));
                let unresolved = self.withheld_dependents(graph, plan, &failed, &journal).await;
                return Err(ExecutionError::DeploymentFailed { failed, unresolved });
            }
            if !timed_out.is_empty() {
                return Err(ExecutionError::ConfirmationTimeout {
                    node_ids: timed_out,
                });
            }
            if cancelled {
                return Err(ExecutionError::Cancelled);
            }
        }

        let result = self.collect_result(graph, &journal).await;
        DeploymentCompleted {
            module,
            deployed: result.len(),
            duration: started.elapsed(),
        }
        .log();
        Ok(result)
    }

    /// Create Pending records for nodes the journal has never seen; count
    /// the already-Confirmed ones for the resume log line.
    async fn seed_pending_records<J: Journal>(
        &self,
        graph: &DeploymentGraph,
        journal: &Arc<Mutex<J>>,
    ) -> Result<usize, ExecutionError> {
        let mut journal = journal.lock().await;
        let mut resumed = 0;
        for node in graph.nodes() {
            match journal.get(&node.id).map(|r| r.status) {
                None => journal.put(ExecutionRecord::pending(node.id.clone()))?,
                Some(ExecutionStatus::Confirmed) => resumed += 1,
                Some(_) => {}
            }
        }
        Ok(resumed)
    }

    /// Classify every node of a batch: skip, re-query, submit, or fail
    /// before submission (unresolvable arguments). Pre-submission failures
    /// are journaled here.
    async fn prepare_batch<J: Journal>(
        &self,
        batch: &[NodeId],
        graph: &DeploymentGraph,
        artifacts: &dyn ArtifactResolver,
        accounts: &[Address],
        journal: &Arc<Mutex<J>>,
    ) -> Result<(Vec<Dispatch>, Vec<NodeFailure>, bool), ExecutionError> {
        let mut dispatches = Vec::new();
        let mut failed = Vec::new();
        let mut cancelled = false;

        let mut journal = journal.lock().await;
        for node_id in batch {
            let node = match graph.node(node_id) {
                Some(node) => node,
                None => {
                    return Err(ExecutionError::Internal(format!(
                        "planned node '{}' missing from graph",
                        node_id
                    )))
                }
            };

            let record = journal.get(node_id);
            match record.map(|r| r.status) {
                Some(ExecutionStatus::Confirmed) => {
                    NodeSkipped {
                        node_id: node_id.as_str(),
                    }
                    .log();
                }
                Some(ExecutionStatus::Submitted) => {
                    // An earlier run crashed or timed out after dispatch. The
                    // transaction may be mined; never re-submit blindly.
                    match record.and_then(|r| r.tx_handle.clone()) {
                        Some(handle) => dispatches.push(Dispatch::Requery {
                            node: node.clone(),
                            handle,
                        }),
                        None => {
                            return Err(ExecutionError::AmbiguousState {
                                node_id: node_id.clone(),
                            })
                        }
                    }
                }
                // Pending, Failed (retry), or unseen.
                _ => {
                    if self.options.cancellation.is_cancelled() {
                        cancelled = true;
                        continue;
                    }
                    match resolve_request(node, artifacts, accounts, &*journal) {
                        Ok(request) => dispatches.push(Dispatch::Submit {
                            node: node.clone(),
                            request,
                        }),
                        Err(err) => {
                            let failure = NodeFailure {
                                node_id: node_id.clone(),
                                error: err.to_string(),
                            };
                            journal.put(ExecutionRecord::failed(
                                node_id.clone(),
                                None,
                                failure.error.clone(),
                            ))?;
                            NodeFailed {
                                node_id: node_id.as_str(),
                                error: &failure.error,
                            }
                            .log();
                            failed.push(failure);
                        }
                    }
                }
            }
        }
        Ok((dispatches, failed, cancelled))
    }

    /// Dispatch a batch's work concurrently under the concurrency limit and
    /// join every outcome before returning.
    async fn dispatch_batch<J>(
        &self,
        dispatches: Vec<Dispatch>,
        journal: &Arc<Mutex<J>>,
    ) -> Result<Vec<NodeOutcome>, ExecutionError>
    where
        J: Journal + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
        let mut tasks = Vec::new();

        for dispatch in dispatches {
            let network = Arc::clone(&self.network);
            let journal = Arc::clone(journal);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.options.confirmation_timeout;
            let cancellation = self.options.cancellation.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return NodeOutcome::NetworkFault(NetworkError::Submission(
                            "dispatch semaphore closed".to_string(),
                        ))
                    }
                };
                execute_node(dispatch, network, journal, timeout, cancellation).await
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(join_error) => {
                    return Err(ExecutionError::Internal(format!(
                        "task join error: {}",
                        join_error
                    )))
                }
            }
        }
        Ok(outcomes)
    }

    /// Planned nodes that were never executed because a (transitive)
    /// dependency failed, each tagged with the failed root it depends on.
    async fn withheld_dependents<J: Journal>(
        &self,
        graph: &DeploymentGraph,
        plan: &ExecutionPlan,
        failed: &[NodeFailure],
        journal: &Arc<Mutex<J>>,
    ) -> Vec<NodeFailure> {
        let failed_ids: HashSet<&NodeId> = failed.iter().map(|f| &f.node_id).collect();
        let reverse_deps = graph.build_reverse_dependencies();
        let journal = journal.lock().await;

        // Walk in batch order: a node's dependencies always sit in earlier
        // batches, so the poisoned set is complete before any dependent is
        // visited. Declaration order would not do; forward references put
        // dependents ahead of their dependencies.
        let mut poisoned: HashMap<NodeId, NodeId> = HashMap::new();
        let mut withheld = Vec::new();
        for node_id in plan.batches().iter().flatten() {
            if failed_ids.contains(node_id) {
                continue;
            }
            let confirmed = journal
                .get(node_id)
                .map(|r| r.status == ExecutionStatus::Confirmed)
                .unwrap_or(false);
            if confirmed {
                continue;
            }
            let empty = Vec::new();
            let deps = reverse_deps.get(node_id).unwrap_or(&empty);
            let root = deps.iter().find_map(|dep| {
                if failed_ids.contains(dep) {
                    Some(dep.clone())
                } else {
                    poisoned.get(dep).cloned()
                }
            });
            if let Some(root) = root {
                withheld.push(NodeFailure {
                    node_id: node_id.clone(),
                    error: ExecutionError::UnresolvedDependency {
                        node_id: node_id.clone(),
                        dependency: root.to_string(),
                    }
                    .to_string(),
                });
                poisoned.insert(node_id.clone(), root);
            }
        }
        withheld
    }

    async fn collect_result<J: Journal>(
        &self,
        graph: &DeploymentGraph,
        journal: &Arc<Mutex<J>>,
    ) -> DeploymentResult {
        let journal = journal.lock().await;
        let mut result = DeploymentResult::new();
        for node in graph.nodes() {
            if let NodeKind::Deploy { name, .. } = &node.kind {
                if let Some(record) = journal.get(&node.id) {
                    if record.status == ExecutionStatus::Confirmed {
                        if let Some(address) = &record.address {
                            result.insert(name.clone(), address.clone());
                        }
                    }
                }
            }
        }
        result
    }
}

/// Submit (or re-query) one node, await its receipt, and journal the
/// terminal transition. Runs inside a spawned task.
async fn execute_node<J: Journal>(
    dispatch: Dispatch,
    network: Arc<dyn Network>,
    journal: Arc<Mutex<J>>,
    timeout: Duration,
    cancellation: CancellationToken,
) -> NodeOutcome {
    let (node, handle) = match dispatch {
        Dispatch::Submit { node, request } => {
            // The token may have fired after this dispatch was prepared,
            // while it sat queued behind the semaphore. Re-queries still
            // proceed; their transaction is already on the wire.
            if cancellation.is_cancelled() {
                return NodeOutcome::Cancelled;
            }
            let handle = match network.submit(request).await {
                Ok(handle) => handle,
                Err(err) => {
                    let failure = NodeFailure {
                        node_id: node.id.clone(),
                        error: format!("submission failed: {}", err),
                    };
                    if let Err(journal_err) = journal.lock().await.put(ExecutionRecord::failed(
                        node.id.clone(),
                        None,
                        failure.error.clone(),
                    )) {
                        return NodeOutcome::JournalFault(journal_err);
                    }
                    NodeFailed {
                        node_id: node.id.as_str(),
                        error: &failure.error,
                    }
                    .log();
                    return NodeOutcome::Failed(failure);
                }
            };

            // Persist the handle before awaiting: a crash between here and
            // the receipt leaves a Submitted record that a resume can
            // re-query instead of re-submitting.
            if let Err(err) = journal
                .lock()
                .await
                .put(ExecutionRecord::submitted(node.id.clone(), handle.clone()))
            {
                return NodeOutcome::JournalFault(err);
            }
            NodeSubmitted {
                node_id: node.id.as_str(),
                tx_handle: handle.as_str(),
            }
            .log();
            (node, handle)
        }
        Dispatch::Requery { node, handle } => (node, handle),
    };

    match network.await_receipt(&handle, timeout).await {
        Ok(Some(receipt)) if receipt.success => {
            let address = match &node.kind {
                NodeKind::Deploy { .. } => receipt.contract_address.clone(),
                NodeKind::Call { .. } => None,
            };
            if let Err(err) = journal.lock().await.put(ExecutionRecord::confirmed(
                node.id.clone(),
                handle,
                address.clone(),
                receipt,
            )) {
                return NodeOutcome::JournalFault(err);
            }
            NodeConfirmed {
                node_id: node.id.as_str(),
                address: address.as_ref().map(|a| a.as_str()),
            }
            .log();
            NodeOutcome::Confirmed
        }
        Ok(Some(receipt)) => {
            let error = receipt
                .revert_reason
                .clone()
                .unwrap_or_else(|| "transaction reverted".to_string());
            let record = ExecutionRecord {
                node_id: node.id.clone(),
                status: ExecutionStatus::Failed,
                tx_handle: Some(handle),
                address: None,
                receipt: Some(receipt),
                error: Some(error.clone()),
            };
            if let Err(err) = journal.lock().await.put(record) {
                return NodeOutcome::JournalFault(err);
            }
            NodeFailed {
                node_id: node.id.as_str(),
                error: &error,
            }
            .log();
            NodeOutcome::Failed(NodeFailure {
                node_id: node.id.clone(),
                error,
            })
        }
        // The bounded wait elapsed. The record stays Submitted so a resume
        // re-queries the network instead of double-submitting.
        Ok(None) => NodeOutcome::TimedOut(node.id.clone()),
        Err(err) => NodeOutcome::NetworkFault(err),
    }
}

/// Resolve a node's arguments to concrete values using Confirmed journal
/// records. The planner guarantees ordering, not success, so a dependency
/// that failed (or was never executed) surfaces here.
fn resolve_request<J: Journal>(
    node: &Node,
    artifacts: &dyn ArtifactResolver,
    accounts: &[Address],
    journal: &J,
) -> Result<TxRequest, ExecutionError> {
    match &node.kind {
        NodeKind::Deploy { contract, args, .. } => {
            let artifact = artifacts.resolve(contract)?;
            Ok(TxRequest::Deploy {
                contract: contract.clone(),
                bytecode: artifact.bytecode,
                args: resolve_values(node, args, accounts, journal)?,
            })
        }
        NodeKind::Call {
            target,
            method,
            args,
        } => {
            let to = confirmed_address(journal, target).ok_or_else(|| {
                ExecutionError::UnresolvedDependency {
                    node_id: node.id.clone(),
                    dependency: target.to_string(),
                }
            })?;
            Ok(TxRequest::Call {
                to,
                method: method.clone(),
                args: resolve_values(node, args, accounts, journal)?,
            })
        }
    }
}

fn resolve_values<J: Journal>(
    node: &Node,
    args: &[NodeArg],
    accounts: &[Address],
    journal: &J,
) -> Result<Vec<serde_json::Value>, ExecutionError> {
    args.iter()
        .map(|arg| match arg {
            NodeArg::Literal(value) => Ok(value.clone()),
            NodeArg::Node(producer) => confirmed_address(journal, producer)
                .map(|address| serde_json::Value::String(address.as_str().to_string()))
                .ok_or_else(|| ExecutionError::UnresolvedDependency {
                    node_id: node.id.clone(),
                    dependency: producer.to_string(),
                }),
            NodeArg::Account(index) => accounts
                .get(*index)
                .map(|address| serde_json::Value::String(address.as_str().to_string()))
                .ok_or_else(|| ExecutionError::UnresolvedDependency {
                    node_id: node.id.clone(),
                    dependency: format!("account {}", index),
                }),
        })
        .collect()
}

fn confirmed_address<J: Journal>(journal: &J, node_id: &NodeId) -> Option<Address> {
    journal
        .get(node_id)
        .filter(|record| record.status == ExecutionStatus::Confirmed)
        .and_then(|record| record.address.clone())
}
