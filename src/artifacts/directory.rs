// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::artifacts::{decode_bytecode, Artifact, ArtifactError, ArtifactResolver};
use serde::Deserialize;
use std::path::PathBuf;

/// On-disk representation of a compiled artifact file.
///
/// Matches the common compiler output layout: `{ contractName, abi,
/// bytecode: "0x..." }`. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct ArtifactFile {
    #[serde(rename = "contractName")]
    contract_name: Option<String>,
    abi: serde_json::Value,
    bytecode: String,
}

/// Resolves artifacts from a directory of `<Contract>.json` files.
#[derive(Debug, Clone)]
pub struct DirectoryArtifacts {
    dir: PathBuf,
}

impl DirectoryArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, contract: &str) -> PathBuf {
        self.dir.join(format!("{}.json", contract))
    }
}

impl ArtifactResolver for DirectoryArtifacts {
    fn resolve(&self, contract: &str) -> Result<Artifact, ArtifactError> {
        let path = self.path_for(contract);
        if !path.is_file() {
            return Err(ArtifactError::UnknownArtifact {
                contract: contract.to_string(),
            });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
            contract: contract.to_string(),
            source,
        })?;
        let file: ArtifactFile =
            serde_json::from_str(&content).map_err(|err| ArtifactError::Malformed {
                contract: contract.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Artifact {
            contract: file.contract_name.unwrap_or_else(|| contract.to_string()),
            abi: file.abi,
            bytecode: decode_bytecode(contract, &file.bytecode)?,
        })
    }

    fn contains(&self, contract: &str) -> bool {
        self.path_for(contract).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_artifact(dir: &std::path::Path, contract: &str, bytecode: &str) {
        let content = serde_json::json!({
            "contractName": contract,
            "abi": [],
            "bytecode": bytecode,
        });
        fs::write(
            dir.join(format!("{}.json", contract)),
            serde_json::to_string(&content).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn resolves_artifact_files_and_decodes_bytecode() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "EventRegistry", "0x6080604052");

        let artifacts = DirectoryArtifacts::new(dir.path());
        assert!(artifacts.contains("EventRegistry"));
        let artifact = artifacts.resolve("EventRegistry").unwrap();
        assert_eq!(artifact.bytecode, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn missing_file_is_unknown_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = DirectoryArtifacts::new(dir.path());
        let err = artifacts.resolve("Ghost").unwrap_err();
        assert!(matches!(err, ArtifactError::UnknownArtifact { .. }));
    }

    #[test]
    fn invalid_hex_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), "Broken", "0xzzzz");

        let artifacts = DirectoryArtifacts::new(dir.path());
        let err = artifacts.resolve("Broken").unwrap_err();
        assert!(matches!(err, ArtifactError::Malformed { .. }));
    }
}
