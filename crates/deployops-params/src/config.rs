//! Environment configuration files.
//!
//! One JSON document per environment, found at `<config-dir>/<env>.json`,
//! holding a `parameters` object keyed by stack name. Anything else in the
//! document is ignored.

use crate::error::ParamsError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "cloudformation/env";

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    parameters: Map<String, Value>,
}

/// Parsed configuration for one environment.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    environment: String,
    path: PathBuf,
    stacks: Map<String, Value>,
}

/// Conventional location of an environment's configuration file.
pub fn config_path(config_dir: impl AsRef<Path>, environment: &str) -> PathBuf {
    config_dir.as_ref().join(format!("{environment}.json"))
}

impl EnvironmentConfig {
    /// Load `<config_dir>/<environment>.json`.
    pub fn load(config_dir: impl AsRef<Path>, environment: &str) -> Result<Self, ParamsError> {
        let path = config_path(config_dir, environment);
        let bytes = fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ParamsError::ConfigNotFound { path: path.clone() }
            } else {
                ParamsError::ConfigRead {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let document: ConfigDocument =
            serde_json::from_slice(&bytes).map_err(|source| ParamsError::ConfigParse {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            environment: environment.to_string(),
            path,
            stacks: document.parameters,
        })
    }

    /// Build a configuration from an already-parsed `parameters` object.
    pub fn from_parameters(environment: &str, stacks: Map<String, Value>) -> Self {
        Self {
            environment: environment.to_string(),
            path: PathBuf::new(),
            stacks,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stack names in document order.
    pub fn stack_names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// The parameter block for `stack`.
    pub fn stack(&self, stack: &str) -> Result<&Map<String, Value>, ParamsError> {
        let block = self
            .stacks
            .get(stack)
            .ok_or_else(|| ParamsError::StackNotFound {
                environment: self.environment.clone(),
                stack: stack.to_string(),
            })?;
        block.as_object().ok_or_else(|| ParamsError::StackNotObject {
            stack: stack.to_string(),
        })
    }
}
