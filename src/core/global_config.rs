//! Global configuration management
//!
//! Reads and manages global settings from `config.toml` in the config directory.
//! Global settings supply the default runner and seed for `compile` and the
//! output preferences.

use crate::config::defaults::DEFAULT_RUNNER;
use crate::core::runner::Runner;
use crate::error::SpecError;
use crate::infra::dirs::TreecomposeDirs;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for treecompose
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GlobalConfig {
    /// Compile defaults
    #[serde(default)]
    pub compile: CompileConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Compile defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompileConfig {
    /// Runner used when the image request names none
    pub runner: Option<String>,

    /// Seed for generated partition and filesystem ids
    pub seed: Option<u64>,
}

/// Output preferences
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print manifests
    pub pretty: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `GlobalConfigError::ParseError` if the config file exists but
    /// contains invalid TOML.
    pub fn load(dirs: &TreecomposeDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Get the effective default runner
    ///
    /// Returns the configured runner if set, otherwise the built-in default.
    pub fn runner(&self) -> Result<Runner, SpecError> {
        self.compile
            .runner
            .as_deref()
            .unwrap_or(DEFAULT_RUNNER)
            .parse()
    }

    /// Whether manifests are pretty-printed
    #[must_use]
    pub fn pretty(&self) -> bool {
        self.output.pretty.unwrap_or(true)
    }
}
