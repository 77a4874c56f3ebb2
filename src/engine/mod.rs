// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod executor;
#[cfg(test)]
mod integration_tests;

pub use executor::{DeploymentExecutor, DeploymentResult, RunOptions};
