// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic in-process network for tests and dry runs.
//!
//! Submissions are recorded and confirmed instantly with addresses derived
//! from a counter, so repeated runs over the same module produce the same
//! output. Failures and withheld confirmations are scripted per contract or
//! method name, which is enough to exercise every engine code path without a
//! chain.

use crate::network::{Address, Network, NetworkError, Receipt, TxHandle, TxRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

enum Outcome {
    /// Receipt available on the next `await_receipt`.
    Ready(Receipt),
    /// Receipt withheld until `release_stalled` — simulates a confirmation
    /// wait that outlives the engine's bounded timeout.
    Stalled(Receipt),
}

#[derive(Default)]
struct StubState {
    next_id: u64,
    submissions: Vec<TxRequest>,
    outcomes: HashMap<TxHandle, Outcome>,
    fail_targets: HashSet<String>,
    stall_targets: HashSet<String>,
}

/// Scriptable stub implementation of [`Network`].
#[derive(Default)]
pub struct StubNetwork {
    state: Mutex<StubState>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transaction for this contract (deploys) revert.
    pub fn fail_contract(&self, contract: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_targets
            .insert(contract.to_string());
    }

    /// Make every invocation of this method revert.
    pub fn fail_method(&self, method: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_targets
            .insert(method.to_string());
    }

    /// Withhold receipts for this contract's transactions until
    /// [`StubNetwork::release_stalled`] is called.
    pub fn stall_contract(&self, contract: &str) {
        self.state
            .lock()
            .unwrap()
            .stall_targets
            .insert(contract.to_string());
    }

    /// Release every withheld receipt; subsequent `await_receipt` calls see
    /// them. Models a transaction that confirmed after the engine gave up
    /// waiting.
    pub fn release_stalled(&self) {
        let mut state = self.state.lock().unwrap();
        state.stall_targets.clear();
        for outcome in state.outcomes.values_mut() {
            if let Outcome::Stalled(receipt) = outcome {
                *outcome = Outcome::Ready(receipt.clone());
            }
        }
    }

    /// Total transactions ever submitted. The idempotence tests assert this
    /// does not grow across a resumed or repeated run.
    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn submissions(&self) -> Vec<TxRequest> {
        self.state.lock().unwrap().submissions.clone()
    }

    fn target_key(request: &TxRequest) -> &str {
        match request {
            TxRequest::Deploy { contract, .. } => contract,
            TxRequest::Call { method, .. } => method,
        }
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn submit(&self, request: TxRequest) -> Result<TxHandle, NetworkError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let handle = TxHandle::new(format!("tx-{}", id));

        let key = Self::target_key(&request).to_string();
        let failed = state.fail_targets.contains(&key);
        let contract_address = match (&request, failed) {
            (TxRequest::Deploy { .. }, false) => {
                Some(Address::new(format!("0x{:040x}", 0xc0ffee_u64 + id)))
            }
            _ => None,
        };
        let receipt = Receipt {
            tx_hash: format!("0x{:064x}", id),
            success: !failed,
            contract_address,
            revert_reason: failed.then(|| format!("execution reverted: {}", key)),
        };

        let outcome = if state.stall_targets.contains(&key) {
            Outcome::Stalled(receipt)
        } else {
            Outcome::Ready(receipt)
        };
        state.outcomes.insert(handle.clone(), outcome);
        state.submissions.push(request);
        Ok(handle)
    }

    async fn await_receipt(
        &self,
        handle: &TxHandle,
        _timeout: Duration,
    ) -> Result<Option<Receipt>, NetworkError> {
        let state = self.state.lock().unwrap();
        match state.outcomes.get(handle) {
            Some(Outcome::Ready(receipt)) => Ok(Some(receipt.clone())),
            Some(Outcome::Stalled(_)) => Ok(None),
            None => Err(NetworkError::UnknownHandle(handle.to_string())),
        }
    }
}
