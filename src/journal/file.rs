// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::graph::NodeId;
use crate::journal::{ExecutionRecord, Journal, JournalError};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Append-only JSON Lines journal.
///
/// Each `put` appends one serialized record and flushes. On open, the whole
/// file is replayed and later lines win, so a record overwritten by a status
/// transition is recovered at its latest state. Appending (rather than
/// rewriting) keeps a crash mid-write from destroying earlier records; a
/// torn final line is ignored on replay.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: File,
    records: BTreeMap<NodeId, ExecutionRecord>,
}

impl FileJournal {
    /// Open or create a journal file and replay its records.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let mut records = BTreeMap::new();

        if path.is_file() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ExecutionRecord>(&line) {
                    Ok(record) => {
                        records.insert(record.node_id.clone(), record);
                    }
                    // A torn trailing line from a crash mid-append.
                    Err(_) => continue,
                }
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Journal for FileJournal {
    fn get(&self, node_id: &NodeId) -> Option<&ExecutionRecord> {
        self.records.get(node_id)
    }

    fn put(&mut self, record: ExecutionRecord) -> Result<(), JournalError> {
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        self.records.insert(record.node_id.clone(), record);
        Ok(())
    }

    fn records(&self) -> Vec<&ExecutionRecord> {
        self.records.values().collect()
    }
}
