// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::module::ModuleDefinition;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a module file.
#[derive(Error, Debug)]
pub enum ModuleLoadError {
    #[error("failed to read module file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse module file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load a module definition from a YAML file.
pub fn load_module<P: AsRef<Path>>(path: P) -> Result<ModuleDefinition, ModuleLoadError> {
    let display = path.as_ref().display().to_string();
    let content = fs::read_to_string(&path).map_err(|source| ModuleLoadError::Io {
        path: display.clone(),
        source,
    })?;
    let module: ModuleDefinition =
        serde_yaml::from_str(&content).map_err(|source| ModuleLoadError::Parse {
            path: display,
            source,
        })?;
    Ok(module)
}
