// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transaction submission seam.
//!
//! The engine treats the chain as two operations: submit a transaction and
//! get back an opaque handle, then await the receipt for that handle under a
//! bounded timeout. Everything else about RPC transports, signing, and gas is
//! behind this trait.

mod stub;

pub use stub::StubNetwork;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A `0x`-prefixed 20-byte hex account or contract address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Validate the `0x` + 40-hex-digit shape.
    pub fn parse(addr: &str) -> Result<Self, NetworkError> {
        let stripped = addr
            .strip_prefix("0x")
            .ok_or_else(|| NetworkError::InvalidAddress(addr.to_string()))?;
        match hex::decode(stripped) {
            Ok(bytes) if bytes.len() == 20 => Ok(Self(addr.to_string())),
            _ => Err(NetworkError::InvalidAddress(addr.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier for a submitted transaction, durable enough to persist
/// in the journal and re-query after a process restart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHandle(String);

impl TxHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transaction the engine wants on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxRequest {
    /// Contract creation with resolved constructor arguments.
    Deploy {
        contract: String,
        #[serde(with = "hex_bytes")]
        bytecode: Vec<u8>,
        args: Vec<serde_json::Value>,
    },
    /// Method invocation on a deployed contract.
    Call {
        to: Address,
        method: String,
        args: Vec<serde_json::Value>,
    },
}

/// Network-confirmed outcome of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub success: bool,
    /// Deployed address, present for successful creation transactions.
    pub contract_address: Option<Address>,
    /// Revert reason, present for failed transactions when available.
    pub revert_reason: Option<String>,
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("transaction submission failed: {0}")]
    Submission(String),

    #[error("unknown transaction handle: {0}")]
    UnknownHandle(String),

    #[error("invalid address: '{0}'")]
    InvalidAddress(String),
}

/// Submit-and-await collaborator the engine runs against.
#[async_trait]
pub trait Network: Send + Sync {
    /// Broadcast a transaction. Returns as soon as the transaction is
    /// accepted into the network's pending set; confirmation is separate.
    async fn submit(&self, request: TxRequest) -> Result<TxHandle, NetworkError>;

    /// Wait up to `timeout` for the receipt of a submitted transaction.
    /// `Ok(None)` means the wait elapsed; the transaction is still pending
    /// and may confirm later.
    async fn await_receipt(
        &self,
        handle: &TxHandle,
        timeout: Duration,
    ) -> Result<Option<Receipt>, NetworkError>;
}

mod hex_bytes {
    //! Serialize bytecode as a `0x` hex string so journal and debug output
    //! stay readable.

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parse_accepts_canonical_form() {
        let addr = Address::parse("0xfd1AF2826012385a84A8E9BE8a1586293FB3980B").unwrap();
        assert_eq!(addr.as_str(), "0xfd1AF2826012385a84A8E9BE8a1586293FB3980B");
    }

    #[test]
    fn address_parse_rejects_bad_shapes() {
        assert!(Address::parse("fd1AF282").is_err());
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzz1AF2826012385a84A8E9BE8a1586293FB3980B").is_err());
    }

    #[test]
    fn tx_request_round_trips_bytecode_as_hex() {
        let request = TxRequest::Deploy {
            contract: "EventRegistry".to_string(),
            bytecode: vec![0x60, 0x80],
            args: vec![serde_json::json!("0x01")],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("0x6080"));
        let back: TxRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
