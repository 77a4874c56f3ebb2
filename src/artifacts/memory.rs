// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::artifacts::{Artifact, ArtifactError, ArtifactResolver};
use std::collections::HashMap;

/// In-memory artifact store for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryArtifacts {
    artifacts: HashMap<String, Artifact>,
}

impl InMemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact with an empty ABI and placeholder bytecode.
    pub fn with_contract(mut self, contract: &str) -> Self {
        self.insert(Artifact {
            contract: contract.to_string(),
            abi: serde_json::Value::Array(vec![]),
            bytecode: vec![0x60, 0x80],
        });
        self
    }

    pub fn insert(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.contract.clone(), artifact);
    }
}

impl ArtifactResolver for InMemoryArtifacts {
    fn resolve(&self, contract: &str) -> Result<Artifact, ArtifactError> {
        self.artifacts
            .get(contract)
            .cloned()
            .ok_or_else(|| ArtifactError::UnknownArtifact {
                contract: contract.to_string(),
            })
    }

    fn contains(&self, contract: &str) -> bool {
        self.artifacts.contains_key(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_contracts() {
        let artifacts = InMemoryArtifacts::new().with_contract("EventRegistry");
        assert!(artifacts.contains("EventRegistry"));
        let artifact = artifacts.resolve("EventRegistry").unwrap();
        assert_eq!(artifact.contract, "EventRegistry");
    }

    #[test]
    fn unknown_contract_is_an_error() {
        let artifacts = InMemoryArtifacts::new();
        let err = artifacts.resolve("Ghost").unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::UnknownArtifact { contract } if contract == "Ghost"
        ));
    }
}
