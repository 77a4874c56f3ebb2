// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative module data model.
//!
//! A module is an ordered list of intents: deploy a named contract, or call a
//! method on a previously declared one. Arguments are literals, references to
//! another intent's future address, or indices into the run's account list.
//! The model is pure data; resolution of references happens in the graph
//! builder, never here.
//!
//! # Example
//! ```yaml
//! module: MizuPass
//! intents:
//!   - kind: deploy
//!     name: MizuPassIdentity
//!     contract: MizuPassIdentity
//!   - kind: deploy
//!     name: EventRegistry
//!     contract: EventRegistry
//!     args:
//!       - ref: MizuPassIdentity
//!   - kind: call
//!     target: EventRegistry
//!     method: setPlatformWallet
//!     args:
//!       - account: 0
//! ```

use serde::{Deserialize, Serialize};

/// A complete declarative deployment module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Module name; prefixes every node id derived from this module.
    pub module: String,
    pub intents: Vec<Intent>,
}

/// A single deployment or configuration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Deploy `contract` and bind the result to `name`.
    Deploy {
        name: String,
        contract: String,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
    /// Invoke `method` on the contract declared as `target`.
    Call {
        target: String,
        method: String,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
}

/// A constructor or call argument.
///
/// Deserialized untagged: `{ ref: Name }` and `{ account: 0 }` are matched
/// first, anything else is taken as a literal JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    /// The future address of the intent declared under this name.
    Ref {
        #[serde(rename = "ref")]
        name: String,
    },
    /// An externally funded account, by index.
    Account { account: usize },
    /// A plain value passed through unchanged.
    Literal(serde_json::Value),
}

impl ArgValue {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        ArgValue::Literal(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        ArgValue::Ref { name: name.into() }
    }

    pub fn account(index: usize) -> Self {
        ArgValue::Account { account: index }
    }
}
