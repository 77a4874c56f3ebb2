// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod artifacts;     // compiled contract lookup
pub mod engine;        // deployment executor
pub mod errors;        // error handling
pub mod graph;         // dependency graph construction
pub mod journal;       // durable per-node execution records
pub mod module;        // declarative module definitions
pub mod network;       // transaction submission seam
pub mod observability;
pub mod planner;       // topological batch planning
