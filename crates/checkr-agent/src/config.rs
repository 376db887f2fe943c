//! Agent configuration
//!
//! Loaded from TOML at startup, falls back to defaults if no config file
//! exists. Command-line flags override whatever the file says.

use crate::clock::{ClockMode, TimeSource};
use checkr_core::{Error, Result};
use checkr_llm::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent name, announced to the model in a system message.
    pub name: String,
    /// Model identifier passed to the completion backend.
    pub model: String,
    /// Extra system instruction added after the name.
    pub instruction: Option<String>,
    /// Tool-call rounds allowed per query before it is abandoned.
    pub max_tool_rounds: usize,
    /// Assertion programs (`module:entry`) loaded at startup.
    pub assertions: Vec<String>,
    pub clock: ClockConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    pub mode: ClockMode,
    /// Seconds per reading in step mode.
    pub step: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// OpenAI-compatible endpoint root, e.g. `http://localhost:11434/v1`.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Pronda".to_string(),
            model: DEFAULT_MODEL.to_string(),
            instruction: None,
            max_tool_rounds: 25,
            assertions: Vec::new(),
            clock: ClockConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            mode: ClockMode::Wall,
            step: 1.0,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 120,
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(Error::Io(_)) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load config from a TOML file, surfacing read and parse failures.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn time_source(&self) -> Arc<dyn TimeSource> {
        self.clock.mode.build(self.clock.step)
    }
}
