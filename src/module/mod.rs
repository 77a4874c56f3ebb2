// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod builder;
mod definition;
mod loader;

pub use builder::{Arg, ContractHandle, ModuleBuilder};
pub use definition::{ArgValue, Intent, ModuleDefinition};
pub use loader::{load_module, ModuleLoadError};
