//! Configuration management for FitSync
//!
//! This crate handles loading `.fitsync/config.toml`. Every section and key
//! is optional; a missing file yields the defaults.

use fit_common::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the config file relative to the workspace root
pub const CONFIG_FILE: &str = ".fitsync/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace root path (set programmatically, not in TOML)
    #[serde(skip)]
    pub root: PathBuf,

    /// Sync engine settings
    #[serde(default)]
    pub sync: SyncSettings,

    /// Durable storage settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Sync engine configuration ([sync])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Failed attempts tolerated before an action is dead-lettered
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-call timeout for remote operations, unbounded when absent
    #[serde(default)]
    pub remote_timeout_ms: Option<u64>,

    /// Periodic drain interval, disabled when absent
    #[serde(default)]
    pub auto_sync_interval_secs: Option<u64>,

    /// How conflicts are routed: "retry" or "dead-letter"
    #[serde(default = "default_conflict_policy")]
    pub conflict_policy: String,
}

fn default_max_retries() -> u32 {
    3
}
fn default_conflict_policy() -> String {
    "retry".to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            remote_timeout_ms: None,
            auto_sync_interval_secs: None,
            conflict_policy: default_conflict_policy(),
        }
    }
}

/// Storage configuration ([storage])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory of the file-backed durable store, relative to the root
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".fitsync/store")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// Logging configuration ([logging])
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Load configuration from workspace root
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = workspace_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self {
                root: workspace_root.to_path_buf(),
                ..Self::default()
            });
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| FitError::ConfigError(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_toml_str(&content)?;
        config.root = workspace_root.to_path_buf();
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FitError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Absolute directory of the durable store
    pub fn store_dir(&self) -> PathBuf {
        if self.storage.dir.is_absolute() {
            self.storage.dir.clone()
        } else {
            self.root.join(&self.storage.dir)
        }
    }
}
