// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::NodeId;
use crate::journal::{ExecutionRecord, Journal, JournalError};
use std::collections::BTreeMap;

/// Non-durable journal for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: BTreeMap<NodeId, ExecutionRecord>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, e.g. to model the journal a crashed run left behind.
    pub fn with_record(mut self, record: ExecutionRecord) -> Self {
        self.records.insert(record.node_id.clone(), record);
        self
    }
}

impl Journal for MemoryJournal {
    fn get(&self, node_id: &NodeId) -> Option<&ExecutionRecord> {
        self.records.get(node_id)
    }

    fn put(&mut self, record: ExecutionRecord) -> Result<(), JournalError> {
        self.records.insert(record.node_id.clone(), record);
        Ok(())
    }

    fn records(&self) -> Vec<&ExecutionRecord> {
        self.records.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::ExecutionStatus;

    #[test]
    fn put_replaces_by_node_id() {
        let id = NodeId::from("M#A");
        let mut journal = MemoryJournal::new();
        journal.put(ExecutionRecord::pending(id.clone())).unwrap();
        journal
            .put(ExecutionRecord::failed(id.clone(), None, "boom".to_string()))
            .unwrap();

        assert_eq!(journal.records().len(), 1);
        assert_eq!(journal.get(&id).unwrap().status, ExecutionStatus::Failed);
    }
}
