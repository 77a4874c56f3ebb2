// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Durable per-node execution records.
//!
//! The journal is the single shared mutable resource of a deployment run.
//! Records are keyed by the deterministic node id, so a re-run of an
//! unchanged module lines up with its previous journal and resumes exactly
//! where it left off. Concurrent writers are not supported; the engine is
//! the one writer for the duration of a run.

mod file;
mod memory;

pub use file::FileJournal;
pub use memory::MemoryJournal;

use crate::graph::NodeId;
use crate::network::{Address, Receipt, TxHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a node within the journal.
///
/// `Confirmed` and `Failed` are terminal for a run; a later run retries
/// `Failed` nodes but never touches `Confirmed` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Planned but not yet dispatched.
    Pending,
    /// Dispatched to the network; outcome unknown.
    Submitted,
    /// Receipt received with success.
    Confirmed,
    /// Receipt received with revert, or submission was rejected.
    Failed,
}

/// Persisted state of one node. Every field round-trips losslessly through
/// the journal encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub node_id: NodeId,
    pub status: ExecutionStatus,
    /// Handle of the dispatched transaction; written before awaiting the
    /// receipt so a crashed run can re-query instead of re-submitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_handle: Option<TxHandle>,
    /// Deployed address, for confirmed deploy nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn pending(node_id: NodeId) -> Self {
        Self {
            node_id,
            status: ExecutionStatus::Pending,
            tx_handle: None,
            address: None,
            receipt: None,
            error: None,
        }
    }

    pub fn submitted(node_id: NodeId, tx_handle: TxHandle) -> Self {
        Self {
            node_id,
            status: ExecutionStatus::Submitted,
            tx_handle: Some(tx_handle),
            address: None,
            receipt: None,
            error: None,
        }
    }

    pub fn confirmed(
        node_id: NodeId,
        tx_handle: TxHandle,
        address: Option<Address>,
        receipt: Receipt,
    ) -> Self {
        Self {
            node_id,
            status: ExecutionStatus::Confirmed,
            tx_handle: Some(tx_handle),
            address,
            receipt: Some(receipt),
            error: None,
        }
    }

    pub fn failed(node_id: NodeId, tx_handle: Option<TxHandle>, error: String) -> Self {
        Self {
            node_id,
            status: ExecutionStatus::Failed,
            tx_handle,
            address: None,
            receipt: None,
            error: Some(error),
        }
    }
}

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable mapping from node id to [`ExecutionRecord`].
pub trait Journal: Send {
    fn get(&self, node_id: &NodeId) -> Option<&ExecutionRecord>;

    /// Insert or replace the record for its node id.
    fn put(&mut self, record: ExecutionRecord) -> Result<(), JournalError>;

    /// All records, ordered by node id.
    fn records(&self) -> Vec<&ExecutionRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_constructors_set_the_expected_fields() {
        let id = NodeId::from("M#A");
        let pending = ExecutionRecord::pending(id.clone());
        assert_eq!(pending.status, ExecutionStatus::Pending);
        assert!(pending.tx_handle.is_none());

        let submitted = ExecutionRecord::submitted(id.clone(), TxHandle::new("tx-1"));
        assert_eq!(submitted.status, ExecutionStatus::Submitted);
        assert!(submitted.tx_handle.is_some());

        let failed = ExecutionRecord::failed(id, None, "revert".to_string());
        assert_eq!(failed.status, ExecutionStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("revert"));
    }

    #[test]
    fn record_round_trips_every_field() {
        let record = ExecutionRecord::confirmed(
            NodeId::from("M#A"),
            TxHandle::new("tx-7"),
            Some(Address::new("0x0000000000000000000000000000000000c0ffef")),
            Receipt {
                tx_hash: "0x07".to_string(),
                success: true,
                contract_address: Some(Address::new(
                    "0x0000000000000000000000000000000000c0ffef",
                )),
                revert_reason: None,
            },
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
