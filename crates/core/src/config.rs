// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fact store configuration
//!
//! Loadable from TOML:
//!
//! ```toml
//! name = "tickets"
//! batch_size = 250
//! append_attempts = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_APPEND_ATTEMPTS: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration of a single fact store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactStoreConfig {
    /// Collection holding the facts
    pub name: String,
    /// Collection holding the stream id counter (default `<name>_ids`)
    #[serde(default)]
    pub counters: Option<String>,
    /// Number of facts fetched per page by cursors
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// How many times `append` may try to persist a fact when its sequence
    /// collides with a concurrent append. 1 disables retrying.
    #[serde(default = "default_append_attempts")]
    pub append_attempts: u32,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_append_attempts() -> u32 {
    DEFAULT_APPEND_ATTEMPTS
}

impl FactStoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counters: None,
            batch_size: DEFAULT_BATCH_SIZE,
            append_attempts: DEFAULT_APPEND_ATTEMPTS,
        }
    }

    pub fn with_counters(mut self, counters: impl Into<String>) -> Self {
        self.counters = Some(counters.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_append_attempts(mut self, attempts: u32) -> Self {
        self.append_attempts = attempts;
        self
    }

    /// Name of the counters collection
    pub fn counters_collection(&self) -> String {
        self.counters
            .clone()
            .unwrap_or_else(|| format!("{}_ids", self.name))
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".to_string()));
        }
        if self.counters_collection() == self.name {
            return Err(ConfigError::Invalid(format!(
                "counters collection must differ from fact collection: {}",
                self.name
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.append_attempts == 0 {
            return Err(ConfigError::Invalid(
                "append_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
