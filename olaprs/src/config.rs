//! Configuration for the planner.
//!
//! TOML-based, every key optional; missing keys fall back to built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, PostgresDialect};
use crate::error::{OlapError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OlapConfig {
    pub planner: PlannerConfig,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Allow COUNT / COUNT DISTINCT of opted-in dimension fields to be answered
    /// from the fact table's service key (default: true).
    pub service_key_substitution: bool,
    /// SQL dialect name (default: "postgres").
    pub dialect: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            service_key_substitution: true,
            dialect: "postgres".to_string(),
        }
    }
}

/// Where table files live.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory containing `data/` and `dimension/`.
    pub dir: Option<PathBuf>,
}

impl OlapConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| OlapError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| OlapError::Config(format!("failed to parse config: {e}")))?;
        config.dialect()?;
        Ok(config)
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `OLAP_CONFIG` environment variable
    /// 2. `./olap.toml` (current directory)
    /// 3. `~/.config/olap/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("OLAP_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from OLAP_CONFIG");
                    return cfg;
                }
                Err(e) => tracing::warn!(path = %path, error = %e, "ignoring OLAP_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("olap.toml") {
            tracing::info!("loaded config from ./olap.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("olap").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// The configured dialect.
    pub fn dialect(&self) -> Result<Box<dyn Dialect>> {
        match self.planner.dialect.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Box::new(PostgresDialect)),
            other => Err(OlapError::Config(format!("unsupported dialect '{other}'"))),
        }
    }
}
