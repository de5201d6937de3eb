//! Configuration loaded from `config.toml`.
//!
//! ```toml
//! [evaluator]
//! variable_match = "token"   # or "substring" (default)
//! celebration_ms = 5000
//!
//! [storage]
//! path = "/tmp/counton.json"
//!
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! counton = "debug"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::calculator::VariableMatch;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub evaluator: EvaluatorConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// How the graph probe recognises the variable `x`.
    pub variable_match: VariableMatch,
    /// How long the success effect stays on after a calculation.
    pub celebration_ms: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            variable_match: VariableMatch::default(),
            celebration_ms: 5000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store file; the platform data dir is used when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default: String,
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl Config {
    /// `<config dir>/counton/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("counton").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file gives the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
