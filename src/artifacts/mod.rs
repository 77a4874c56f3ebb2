// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compiled contract artifact lookup.
//!
//! An artifact is the compiled interface of a named contract: its ABI and its
//! creation bytecode. Resolution is a pure lookup with no side effects; the
//! graph builder queries it to fail fast on unknown contract names, and the
//! engine queries it again for the bytecode of each deploy node.

mod directory;
mod memory;

pub use directory::DirectoryArtifacts;
pub use memory::InMemoryArtifacts;

use thiserror::Error;

/// Compiled interface for a named contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub contract: String,
    /// Raw ABI as parsed JSON; the engine treats it as opaque.
    pub abi: serde_json::Value,
    /// Creation bytecode, decoded from its `0x` hex form.
    pub bytecode: Vec<u8>,
}

/// Errors raised while resolving an artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// No compiled output exists for the requested contract name.
    #[error("unknown artifact: no compiled output for contract '{contract}'")]
    UnknownArtifact { contract: String },

    /// The artifact exists but could not be decoded.
    #[error("malformed artifact for contract '{contract}': {reason}")]
    Malformed { contract: String, reason: String },

    #[error("failed to read artifact for contract '{contract}': {source}")]
    Io {
        contract: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maps a contract name to its compiled interface.
pub trait ArtifactResolver: Send + Sync {
    fn resolve(&self, contract: &str) -> Result<Artifact, ArtifactError>;

    /// Cheap existence check used by the graph builder.
    fn contains(&self, contract: &str) -> bool {
        self.resolve(contract).is_ok()
    }
}

/// Strip an optional `0x` prefix and decode hex bytecode.
pub(crate) fn decode_bytecode(contract: &str, bytecode: &str) -> Result<Vec<u8>, ArtifactError> {
    let stripped = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    hex::decode(stripped).map_err(|err| ArtifactError::Malformed {
        contract: contract.to_string(),
        reason: format!("invalid bytecode hex: {}", err),
    })
}
