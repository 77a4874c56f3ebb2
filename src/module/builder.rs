// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fluent, two-phase module builder.
//!
//! Registration returns opaque [`ContractHandle`] tokens instead of concrete
//! ids; `build()` performs the deferred binding into a plain
//! [`ModuleDefinition`]. The builder never resolves references itself: by-name
//! references (including forward references to intents declared later) are
//! carried through as-is and validated during graph construction.
//!
//! # Example
//! ```rust
//! use kindling::module::{Arg, ModuleBuilder};
//!
//! let mut m = ModuleBuilder::new("MizuPass");
//! let identity = m.contract("MizuPassIdentity");
//! let jpym = m.contract("MockJPYM");
//! let registry = m.contract_with_args("EventRegistry", vec![Arg::contract(identity)]);
//! m.call(registry, "setJPYMAddress", vec![Arg::contract(jpym)]);
//! m.call(registry, "setPlatformWallet", vec![Arg::account(0)]);
//! let module = m.build();
//!
//! assert_eq!(module.module, "MizuPass");
//! assert_eq!(module.intents.len(), 5);
//! ```

use crate::module::{ArgValue, Intent, ModuleDefinition};

/// Opaque token for a contract registered on a [`ModuleBuilder`].
///
/// Valid only for the builder that minted it; indexes into the builder's
/// intent list, so it stays correct regardless of later registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractHandle(usize);

/// A builder-level argument, resolved to an [`ArgValue`] during `build()`.
#[derive(Debug, Clone)]
pub enum Arg {
    Literal(serde_json::Value),
    /// The future address of a contract registered on this builder.
    Contract(ContractHandle),
    /// A by-name reference, allowing forward references to intents that have
    /// not been registered yet.
    Named(String),
    /// An externally funded account, by index.
    Account(usize),
}

impl Arg {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Arg::Literal(value.into())
    }

    pub fn contract(handle: ContractHandle) -> Self {
        Arg::Contract(handle)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Arg::Named(name.into())
    }

    pub fn account(index: usize) -> Self {
        Arg::Account(index)
    }
}

enum BuilderIntent {
    Deploy {
        name: String,
        contract: String,
        args: Vec<Arg>,
    },
    Call {
        target: Target,
        method: String,
        args: Vec<Arg>,
    },
}

enum Target {
    Handle(ContractHandle),
    Named(String),
}

/// Collects deploy and call intents, then binds handles to declared names.
pub struct ModuleBuilder {
    name: String,
    intents: Vec<BuilderIntent>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intents: Vec::new(),
        }
    }

    /// Register a contract deployment with no constructor arguments. The
    /// declared name doubles as the artifact name.
    pub fn contract(&mut self, name: &str) -> ContractHandle {
        self.contract_with_args(name, Vec::new())
    }

    /// Register a contract deployment with constructor arguments.
    pub fn contract_with_args(&mut self, name: &str, args: Vec<Arg>) -> ContractHandle {
        self.contract_named(name, name, args)
    }

    /// Register a deployment where the declared name differs from the
    /// artifact name (e.g. two instances of the same contract).
    pub fn contract_named(&mut self, name: &str, contract: &str, args: Vec<Arg>) -> ContractHandle {
        let handle = ContractHandle(self.intents.len());
        self.intents.push(BuilderIntent::Deploy {
            name: name.to_string(),
            contract: contract.to_string(),
            args,
        });
        handle
    }

    /// Register a post-deployment method call on a registered contract.
    pub fn call(&mut self, target: ContractHandle, method: &str, args: Vec<Arg>) {
        self.intents.push(BuilderIntent::Call {
            target: Target::Handle(target),
            method: method.to_string(),
            args,
        });
    }

    /// Register a call targeting a contract by declared name. The name does
    /// not need to be registered yet; it is checked during graph construction.
    pub fn call_by_name(&mut self, target: &str, method: &str, args: Vec<Arg>) {
        self.intents.push(BuilderIntent::Call {
            target: Target::Named(target.to_string()),
            method: method.to_string(),
            args,
        });
    }

    /// Bind every handle to its declared name and produce the definition.
    pub fn build(self) -> ModuleDefinition {
        // Handles index into the intent list; deploys record their name there.
        let names: Vec<Option<String>> = self
            .intents
            .iter()
            .map(|intent| match intent {
                BuilderIntent::Deploy { name, .. } => Some(name.clone()),
                BuilderIntent::Call { .. } => None,
            })
            .collect();

        let resolve_name = |handle: &ContractHandle| -> String {
            names[handle.0]
                .clone()
                .unwrap_or_else(|| format!("<intent {}>", handle.0))
        };

        let resolve_arg = |arg: &Arg| -> ArgValue {
            match arg {
                Arg::Literal(value) => ArgValue::Literal(value.clone()),
                Arg::Contract(handle) => ArgValue::reference(resolve_name(handle)),
                Arg::Named(name) => ArgValue::reference(name.clone()),
                Arg::Account(index) => ArgValue::account(*index),
            }
        };

        let intents = self
            .intents
            .iter()
            .map(|intent| match intent {
                BuilderIntent::Deploy {
                    name,
                    contract,
                    args,
                } => Intent::Deploy {
                    name: name.clone(),
                    contract: contract.clone(),
                    args: args.iter().map(resolve_arg).collect(),
                },
                BuilderIntent::Call {
                    target,
                    method,
                    args,
                } => Intent::Call {
                    target: match target {
                        Target::Handle(handle) => resolve_name(handle),
                        Target::Named(name) => name.clone(),
                    },
                    method: method.clone(),
                    args: args.iter().map(resolve_arg).collect(),
                },
            })
            .collect();

        ModuleDefinition {
            module: self.name,
            intents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_bind_to_declared_names() {
        let mut m = ModuleBuilder::new("MizuPass");
        let identity = m.contract("MizuPassIdentity");
        let registry = m.contract_with_args("EventRegistry", vec![Arg::contract(identity)]);
        m.call(registry, "setPlatformWallet", vec![Arg::account(0)]);

        let module = m.build();
        assert_eq!(module.module, "MizuPass");
        assert_eq!(
            module.intents[1],
            Intent::Deploy {
                name: "EventRegistry".to_string(),
                contract: "EventRegistry".to_string(),
                args: vec![ArgValue::reference("MizuPassIdentity")],
            }
        );
        assert_eq!(
            module.intents[2],
            Intent::Call {
                target: "EventRegistry".to_string(),
                method: "setPlatformWallet".to_string(),
                args: vec![ArgValue::account(0)],
            }
        );
    }

    #[test]
    fn forward_named_references_survive_build() {
        let mut m = ModuleBuilder::new("Demo");
        // Gateway is referenced before it is registered.
        m.contract_with_args("Shop", vec![Arg::named("Gateway")]);
        m.contract("Gateway");

        let module = m.build();
        assert_eq!(
            module.intents[0],
            Intent::Deploy {
                name: "Shop".to_string(),
                contract: "Shop".to_string(),
                args: vec![ArgValue::reference("Gateway")],
            }
        );
    }

    #[test]
    fn two_instances_of_one_contract_keep_distinct_names() {
        let mut m = ModuleBuilder::new("Demo");
        let a = m.contract_named("TokenA", "MockToken", vec![]);
        let b = m.contract_named("TokenB", "MockToken", vec![]);
        m.call(a, "mint", vec![Arg::literal(1)]);
        m.call(b, "mint", vec![Arg::literal(2)]);

        let module = m.build();
        match (&module.intents[2], &module.intents[3]) {
            (
                Intent::Call { target: ta, .. },
                Intent::Call { target: tb, .. },
            ) => {
                assert_eq!(ta, "TokenA");
                assert_eq!(tb, "TokenB");
            }
            other => panic!("unexpected intents: {:?}", other),
        }
    }
}
