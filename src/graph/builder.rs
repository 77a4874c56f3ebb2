// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Builds a [`DeploymentGraph`] from a declarative module.
//!
//! Construction accumulates every error it can find rather than stopping at
//! the first, so a user sees all duplicate names, dangling references, and
//! unknown artifacts in one pass. The builder performs no network work; its
//! only collaborator is the artifact resolver, consulted to verify that every
//! deployed contract has compiled output.
//!
//! # Checks
//!
//! 1. **Name uniqueness** - deploy intents must declare distinct names
//! 2. **Reference resolution** - every `ref` argument and call target must
//!    name a deploy intent in the same module (forward references are fine,
//!    self-references are not)
//! 3. **Artifact existence** - every deployed contract must resolve
//!
//! Cycle detection is deliberately left to the planner: it falls out of the
//! topological layering for free, and the planner runs before any execution
//! attempt anyway.

use crate::artifacts::ArtifactResolver;
use crate::errors::GraphError;
use crate::graph::{DeploymentGraph, Node, NodeArg, NodeId, NodeKind};
use crate::module::{ArgValue, Intent, ModuleDefinition};
use std::collections::HashMap;

/// Build the dependency graph for a module, validating names, references,
/// and artifacts. Returns every error found when the module is invalid.
pub fn build_graph(
    module: &ModuleDefinition,
    artifacts: &dyn ArtifactResolver,
) -> Result<DeploymentGraph, Vec<GraphError>> {
    let mut errors = Vec::new();

    // Pass 1: declared deploy names -> deterministic node ids. Forward
    // references are legal, so the full name set must exist before any
    // argument is resolved.
    let mut names: HashMap<String, NodeId> = HashMap::new();
    for intent in &module.intents {
        if let Intent::Deploy { name, .. } = intent {
            let id = NodeId::new(format!("{}#{}", module.module, name));
            if names.insert(name.clone(), id).is_some() {
                errors.push(GraphError::DuplicateName { name: name.clone() });
            }
        }
    }

    // Pass 2: mint nodes, resolve references, wire producer -> consumer edges.
    let mut nodes: Vec<Node> = Vec::new();
    let mut edges: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut call_ordinals: HashMap<String, usize> = HashMap::new();

    for (index, intent) in module.intents.iter().enumerate() {
        match intent {
            Intent::Deploy {
                name,
                contract,
                args,
            } => {
                let id = names[name.as_str()].clone();
                if !artifacts.contains(contract) {
                    errors.push(GraphError::UnknownArtifact {
                        contract: contract.clone(),
                    });
                }
                let node_args = resolve_args(args, &id, Some(name), &names, &mut errors);
                for arg in &node_args {
                    if let NodeArg::Node(producer) = arg {
                        add_edge(&mut edges, producer, &id);
                    }
                }
                nodes.push(Node {
                    id,
                    index,
                    kind: NodeKind::Deploy {
                        name: name.clone(),
                        contract: contract.clone(),
                        args: node_args,
                    },
                });
            }
            Intent::Call {
                target,
                method,
                args,
            } => {
                // Repeated calls to the same target/method get ordinal ids so
                // each occurrence journals independently.
                let base = format!("{}#{}.{}", module.module, target, method);
                let ordinal = call_ordinals
                    .entry(base.clone())
                    .and_modify(|n| *n += 1)
                    .or_insert(1);
                let id = if *ordinal == 1 {
                    NodeId::new(base)
                } else {
                    NodeId::new(format!("{}#{}", base, ordinal))
                };

                let target_id = match names.get(target.as_str()) {
                    Some(target_id) => target_id.clone(),
                    None => {
                        errors.push(GraphError::DanglingReference {
                            node_id: id,
                            missing: target.clone(),
                        });
                        continue;
                    }
                };

                let node_args = resolve_args(args, &id, None, &names, &mut errors);
                // Implicit edge: a call always waits for its target's deploy.
                add_edge(&mut edges, &target_id, &id);
                for arg in &node_args {
                    if let NodeArg::Node(producer) = arg {
                        add_edge(&mut edges, producer, &id);
                    }
                }
                nodes.push(Node {
                    id,
                    index,
                    kind: NodeKind::Call {
                        target: target_id,
                        method: method.clone(),
                        args: node_args,
                    },
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(DeploymentGraph::new(nodes, edges))
    } else {
        Err(errors)
    }
}

fn resolve_args(
    args: &[ArgValue],
    node_id: &NodeId,
    own_name: Option<&str>,
    names: &HashMap<String, NodeId>,
    errors: &mut Vec<GraphError>,
) -> Vec<NodeArg> {
    args.iter()
        .map(|arg| match arg {
            ArgValue::Literal(value) => NodeArg::Literal(value.clone()),
            ArgValue::Account { account } => NodeArg::Account(*account),
            ArgValue::Ref { name } => {
                if own_name == Some(name.as_str()) {
                    errors.push(GraphError::SelfReference {
                        node_id: node_id.clone(),
                    });
                    return NodeArg::Node(node_id.clone());
                }
                match names.get(name.as_str()) {
                    Some(producer) => NodeArg::Node(producer.clone()),
                    None => {
                        errors.push(GraphError::DanglingReference {
                            node_id: node_id.clone(),
                            missing: name.clone(),
                        });
                        NodeArg::Node(NodeId::new(name.clone()))
                    }
                }
            }
        })
        .collect()
}

fn add_edge(edges: &mut HashMap<NodeId, Vec<NodeId>>, producer: &NodeId, consumer: &NodeId) {
    let consumers = edges.entry(producer.clone()).or_default();
    if !consumers.contains(consumer) {
        consumers.push(consumer.clone());
    }
}
