// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod builder;
mod types;

pub use builder::build_graph;
pub use types::{DeploymentGraph, Node, NodeArg, NodeId, NodeKind};
