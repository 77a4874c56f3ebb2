// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests: module definition -> graph -> plan -> execution against
//! the stub network, including resume, failure, timeout, and cancellation
//! paths.

use crate::artifacts::InMemoryArtifacts;
use crate::engine::{DeploymentExecutor, DeploymentResult, RunOptions};
use crate::errors::ExecutionError;
use crate::graph::{build_graph, DeploymentGraph, NodeId};
use crate::journal::{
    ExecutionRecord, ExecutionStatus, FileJournal, Journal, MemoryJournal,
};
use crate::module::{Arg, ModuleBuilder, ModuleDefinition};
use crate::network::{
    Address, Network, NetworkError, Receipt, StubNetwork, TxHandle, TxRequest,
};
use crate::planner::{plan, ExecutionPlan};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PLATFORM_WALLET: &str = "0xfd1AF2826012385a84A8E9BE8a1586293FB3980B";

fn mizupass_module() -> ModuleDefinition {
    let mut m = ModuleBuilder::new("MizuPass");
    let identity = m.contract("MizuPassIdentity");
    m.contract("StealthAddressManager");
    let jpym = m.contract("MockJPYM");
    let registry = m.contract_with_args("EventRegistry", vec![Arg::contract(identity)]);
    m.call(registry, "setJPYMAddress", vec![Arg::contract(jpym)]);
    m.call(registry, "setPlatformWallet", vec![Arg::literal(PLATFORM_WALLET)]);
    m.build()
}

fn mizupass_artifacts() -> InMemoryArtifacts {
    [
        "MizuPassIdentity",
        "StealthAddressManager",
        "MockJPYM",
        "EventRegistry",
    ]
    .iter()
    .fold(InMemoryArtifacts::new(), |acc, c| acc.with_contract(c))
}

/// Id -> Manager(Id) -> Manager.setOwner: one node per batch.
fn chain_module() -> ModuleDefinition {
    let mut m = ModuleBuilder::new("M");
    let id = m.contract("Id");
    let manager = m.contract_with_args("Manager", vec![Arg::contract(id)]);
    m.call(manager, "setOwner", vec![Arg::account(0)]);
    m.build()
}

fn chain_artifacts() -> InMemoryArtifacts {
    InMemoryArtifacts::new()
        .with_contract("Id")
        .with_contract("Manager")
}

fn planned(
    module: &ModuleDefinition,
    artifacts: &InMemoryArtifacts,
) -> (DeploymentGraph, ExecutionPlan) {
    let graph = build_graph(module, artifacts).unwrap();
    let plan = plan(&graph).unwrap();
    (graph, plan)
}

fn accounts() -> Vec<Address> {
    vec![Address::new(PLATFORM_WALLET)]
}

async fn run_once<J: Journal + 'static>(
    network: &Arc<StubNetwork>,
    module: &ModuleDefinition,
    artifacts: &InMemoryArtifacts,
    journal: J,
) -> Result<DeploymentResult, ExecutionError> {
    let (graph, plan) = planned(module, artifacts);
    let executor = DeploymentExecutor::new(Arc::clone(network) as Arc<dyn crate::network::Network>);
    executor
        .run(&module.module, &graph, &plan, artifacts, &accounts(), journal)
        .await
}

#[tokio::test]
async fn full_module_deploys_every_contract() {
    let network = Arc::new(StubNetwork::new());
    let module = mizupass_module();
    let artifacts = mizupass_artifacts();

    let result = run_once(&network, &module, &artifacts, MemoryJournal::new())
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    for name in [
        "MizuPassIdentity",
        "StealthAddressManager",
        "MockJPYM",
        "EventRegistry",
    ] {
        assert!(result.contains_key(name), "missing {}", name);
    }
    let addresses: std::collections::HashSet<&Address> = result.values().collect();
    assert_eq!(addresses.len(), 4, "addresses must be distinct");
    // 4 deploys + 2 calls.
    assert_eq!(network.submission_count(), 6);
}

#[tokio::test]
async fn call_arguments_resolve_to_confirmed_addresses() {
    let network = Arc::new(StubNetwork::new());
    let module = mizupass_module();
    let artifacts = mizupass_artifacts();

    let result = run_once(&network, &module, &artifacts, MemoryJournal::new())
        .await
        .unwrap();

    let registry = result["EventRegistry"].clone();
    let jpym = result["MockJPYM"].clone();
    let set_jpym = network
        .submissions()
        .into_iter()
        .find_map(|request| match request {
            TxRequest::Call { to, method, args } if method == "setJPYMAddress" => {
                Some((to, args))
            }
            _ => None,
        })
        .expect("setJPYMAddress was never submitted");

    assert_eq!(set_jpym.0, registry);
    assert_eq!(
        set_jpym.1,
        vec![serde_json::Value::String(jpym.as_str().to_string())]
    );
}

#[tokio::test]
async fn account_arguments_resolve_by_index() {
    let network = Arc::new(StubNetwork::new());
    let module = chain_module();
    let artifacts = chain_artifacts();

    let result = run_once(&network, &module, &artifacts, MemoryJournal::new())
        .await
        .unwrap();
    assert_ne!(result["Id"], result["Manager"]);

    let set_owner = network
        .submissions()
        .into_iter()
        .find_map(|request| match request {
            TxRequest::Call { method, args, .. } if method == "setOwner" => Some(args),
            _ => None,
        })
        .expect("setOwner was never submitted");
    assert_eq!(
        set_owner,
        vec![serde_json::Value::String(PLATFORM_WALLET.to_string())]
    );
}

#[tokio::test]
async fn out_of_range_account_fails_before_submission() {
    let network = Arc::new(StubNetwork::new());
    let module = chain_module();
    let artifacts = chain_artifacts();
    let (graph, plan) = planned(&module, &artifacts);
    let executor = DeploymentExecutor::new(Arc::clone(&network) as Arc<dyn crate::network::Network>);

    // No accounts configured, but the call references account 0.
    let err = executor
        .run(&module.module, &graph, &plan, &artifacts, &[], MemoryJournal::new())
        .await
        .unwrap_err();

    match err {
        ExecutionError::DeploymentFailed { failed, unresolved } => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].node_id, NodeId::from("M#Manager.setOwner"));
            assert!(failed[0].error.contains("account 0"));
            assert!(unresolved.is_empty());
        }
        other => panic!("expected DeploymentFailed, got {:?}", other),
    }
    // Both deploys went through; the call never reached the network.
    assert_eq!(network.submission_count(), 2);
}

#[tokio::test]
async fn completed_run_is_idempotent_across_a_journal_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    let network = Arc::new(StubNetwork::new());
    let module = mizupass_module();
    let artifacts = mizupass_artifacts();

    let first = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(network.submission_count(), 6);

    let second = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(first, second);
    // Every node was already Confirmed; nothing was re-submitted.
    assert_eq!(network.submission_count(), 6);
}

#[tokio::test]
async fn failed_dependency_withholds_dependents() {
    let network = Arc::new(StubNetwork::new());
    network.fail_contract("Manager");
    let module = chain_module();
    let artifacts = chain_artifacts();

    let err = run_once(&network, &module, &artifacts, MemoryJournal::new())
        .await
        .unwrap_err();

    match err {
        ExecutionError::DeploymentFailed { failed, unresolved } => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].node_id, NodeId::from("M#Manager"));
            assert!(failed[0].error.contains("execution reverted"));
            assert_eq!(unresolved.len(), 1);
            assert_eq!(unresolved[0].node_id, NodeId::from("M#Manager.setOwner"));
            assert!(unresolved[0].error.contains("M#Manager"));
        }
        other => panic!("expected DeploymentFailed, got {:?}", other),
    }
    // Id and Manager were submitted; setOwner was withheld.
    assert_eq!(network.submission_count(), 2);
}

#[tokio::test]
async fn transitive_dependents_are_withheld_across_forward_declarations() {
    let network = Arc::new(StubNetwork::new());
    network.fail_contract("A");
    // Dependents are declared before the contracts they reference, so the
    // failure must propagate against declaration order.
    let mut m = ModuleBuilder::new("M");
    m.contract_with_args("C", vec![Arg::named("B")]);
    m.contract_with_args("B", vec![Arg::named("A")]);
    m.contract("A");
    let module = m.build();
    let artifacts = InMemoryArtifacts::new()
        .with_contract("A")
        .with_contract("B")
        .with_contract("C");

    let err = run_once(&network, &module, &artifacts, MemoryJournal::new())
        .await
        .unwrap_err();

    match err {
        ExecutionError::DeploymentFailed { failed, unresolved } => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].node_id, NodeId::from("M#A"));
            let ids: Vec<&str> = unresolved.iter().map(|f| f.node_id.as_str()).collect();
            assert_eq!(ids, vec!["M#B", "M#C"]);
            // Both entries name the failed root, not the intermediate node.
            assert!(unresolved[0].error.contains("M#A"));
            assert!(unresolved[1].error.contains("M#A"));
        }
        other => panic!("expected DeploymentFailed, got {:?}", other),
    }
    assert_eq!(network.submission_count(), 1);
}

#[tokio::test]
async fn failed_nodes_are_retried_on_rerun() {
    let network = Arc::new(StubNetwork::new());
    network.fail_contract("Manager");
    let module = chain_module();
    let artifacts = chain_artifacts();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");

    let err = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExecutionError::DeploymentFailed { .. }));

    // The revert was transient; the rerun retries Manager but not Id.
    let fresh = Arc::new(StubNetwork::new());
    let result = run_once(
        &fresh,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(result.len(), 2);
    // Manager deploy + setOwner call only; Id stayed Confirmed.
    assert_eq!(fresh.submission_count(), 2);
    assert!(!fresh
        .submissions()
        .iter()
        .any(|r| matches!(r, TxRequest::Deploy { contract, .. } if contract == "Id")));
}

#[tokio::test]
async fn timed_out_node_stays_submitted_and_resumes_by_handle() {
    let network = Arc::new(StubNetwork::new());
    network.stall_contract("Id");
    let module = chain_module();
    let artifacts = chain_artifacts();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");

    let err = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap_err();
    match err {
        ExecutionError::ConfirmationTimeout { node_ids } => {
            assert_eq!(node_ids, vec![NodeId::from("M#Id")]);
        }
        other => panic!("expected ConfirmationTimeout, got {:?}", other),
    }
    assert_eq!(network.submission_count(), 1);

    // The record kept the handle, not a Failed status.
    {
        let journal = FileJournal::open(&path).unwrap();
        let record = journal.get(&NodeId::from("M#Id")).unwrap();
        assert_eq!(record.status, ExecutionStatus::Submitted);
        assert!(record.tx_handle.is_some());
    }

    // The transaction confirmed while nobody was watching; the resumed run
    // re-queries by handle instead of deploying Id twice.
    network.release_stalled();
    let result = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(network.submission_count(), 3);
}

#[tokio::test]
async fn submitted_record_without_handle_aborts_the_run() {
    let network = Arc::new(StubNetwork::new());
    let module = chain_module();
    let artifacts = chain_artifacts();
    let (graph, plan) = planned(&module, &artifacts);

    let journal = MemoryJournal::new().with_record(ExecutionRecord {
        node_id: NodeId::from("M#Id"),
        status: ExecutionStatus::Submitted,
        tx_handle: None,
        address: None,
        receipt: None,
        error: None,
    });

    let executor = DeploymentExecutor::new(Arc::clone(&network) as Arc<dyn crate::network::Network>);
    let err = executor
        .run(&module.module, &graph, &plan, &artifacts, &accounts(), journal)
        .await
        .unwrap_err();

    match err {
        ExecutionError::AmbiguousState { node_id } => {
            assert_eq!(node_id, NodeId::from("M#Id"));
        }
        other => panic!("expected AmbiguousState, got {:?}", other),
    }
    assert_eq!(network.submission_count(), 0);
}

#[tokio::test]
async fn cancellation_before_the_run_submits_nothing() {
    let network = Arc::new(StubNetwork::new());
    let module = chain_module();
    let artifacts = chain_artifacts();
    let (graph, plan) = planned(&module, &artifacts);

    let token = CancellationToken::new();
    token.cancel();
    let executor = DeploymentExecutor::with_options(
        Arc::clone(&network) as Arc<dyn crate::network::Network>,
        RunOptions {
            cancellation: token,
            ..RunOptions::default()
        },
    );

    let err = executor
        .run(
            &module.module,
            &graph,
            &plan,
            &artifacts,
            &accounts(),
            MemoryJournal::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Cancelled));
    assert_eq!(network.submission_count(), 0);
}

/// Cancels the shared token on the first submission, so the rest of the
/// batch observes the cancellation while queued behind the semaphore.
struct CancelOnSubmit {
    inner: StubNetwork,
    token: CancellationToken,
}

#[async_trait]
impl Network for CancelOnSubmit {
    async fn submit(&self, request: TxRequest) -> Result<TxHandle, NetworkError> {
        self.token.cancel();
        self.inner.submit(request).await
    }

    async fn await_receipt(
        &self,
        handle: &TxHandle,
        timeout: Duration,
    ) -> Result<Option<Receipt>, NetworkError> {
        self.inner.await_receipt(handle, timeout).await
    }
}

#[tokio::test]
async fn cancellation_mid_batch_stops_further_submissions() {
    let token = CancellationToken::new();
    let network = Arc::new(CancelOnSubmit {
        inner: StubNetwork::new(),
        token: token.clone(),
    });

    // Two independent deploys share batch 0; concurrency 1 queues the
    // second dispatch behind the first, which cancels the run on submit.
    let mut m = ModuleBuilder::new("M");
    m.contract("A");
    m.contract("B");
    let module = m.build();
    let artifacts = InMemoryArtifacts::new()
        .with_contract("A")
        .with_contract("B");
    let (graph, plan) = planned(&module, &artifacts);

    let executor = DeploymentExecutor::with_options(
        Arc::clone(&network) as Arc<dyn Network>,
        RunOptions {
            max_concurrency: 1,
            cancellation: token,
            ..RunOptions::default()
        },
    );
    let err = executor
        .run(
            &module.module,
            &graph,
            &plan,
            &artifacts,
            &[],
            MemoryJournal::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutionError::Cancelled));
    assert_eq!(network.inner.submission_count(), 1);
}

#[tokio::test]
async fn cancelled_run_resumes_cleanly() {
    let network = Arc::new(StubNetwork::new());
    let module = chain_module();
    let artifacts = chain_artifacts();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");

    let token = CancellationToken::new();
    token.cancel();
    let executor = DeploymentExecutor::with_options(
        Arc::clone(&network) as Arc<dyn crate::network::Network>,
        RunOptions {
            cancellation: token,
            ..RunOptions::default()
        },
    );
    let (graph, plan) = planned(&module, &artifacts);
    let err = executor
        .run(
            &module.module,
            &graph,
            &plan,
            &artifacts,
            &accounts(),
            FileJournal::open(&path).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Cancelled));

    let result = run_once(
        &network,
        &module,
        &artifacts,
        FileJournal::open(&path).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(network.submission_count(), 3);
}
