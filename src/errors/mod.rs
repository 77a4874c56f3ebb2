// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod execution;
mod graph;

pub use execution::{ExecutionError, NodeFailure};
pub use graph::GraphError;
