//! Configuration file for a kinship deployment

use crate::error::{Result, ServiceError};
use kinship_engine::EngineConfig;
use kinship_janitor::JanitorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration, usually read from `kinship.toml`
///
/// Every key is optional; missing sections take their defaults.
///
/// ```toml
/// db_path = "kinship.db"
/// graph_enabled = true
/// log_filter = "info,kinship_engine=debug"
///
/// [engine]
/// path_hop_limit = 4
/// diffusion_radius = 2
///
/// [janitor]
/// repair_interval_secs = 900
/// job_ttl_secs = 3600
/// dry_run = false
/// auto_promote = true
/// auto_backfill = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinshipConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Mirror structural edges into the in-process graph
    pub graph_enabled: bool,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,

    /// Propagation settings
    pub engine: EngineConfig,

    /// Repair and re-inference settings
    pub janitor: JanitorConfig,
}

impl Default for KinshipConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("kinship.db"),
            graph_enabled: true,
            log_filter: "info".to_string(),
            engine: EngineConfig::default(),
            janitor: JanitorConfig::default(),
        }
    }
}

impl KinshipConfig {
    /// Read and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ServiceError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Check nested sections and the database path
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ServiceError::Config("db_path must not be empty".to_string()));
        }
        self.engine
            .validate()
            .map_err(|e| ServiceError::Config(format!("[engine] {}", e)))?;
        self.janitor
            .validate()
            .map_err(|e| ServiceError::Config(format!("[janitor] {}", e)))?;
        Ok(())
    }
}
