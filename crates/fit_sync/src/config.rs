//! Configuration for the sync engine

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resolver::ConflictPolicy;

/// Tunables of the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Failed attempts an action may accumulate before it is dead-lettered
    /// (default: 3)
    pub max_retries: u32,

    /// Timeout applied to each remote call; `None` waits indefinitely
    pub remote_timeout: Option<Duration>,

    /// Periodic drain interval; `None` drains only on explicit triggers
    pub auto_sync_interval: Option<Duration>,

    /// Routing of conflict failures (default: retry like any failure)
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            remote_timeout: None,
            auto_sync_interval: None,
            conflict_policy: ConflictPolicy::Retry,
        }
    }
}

impl SyncConfig {
    /// Build from the `[sync]` section of `.fitsync/config.toml`
    pub fn from_settings(settings: &fit_config::SyncSettings) -> crate::Result<Self> {
        let conflict_policy = settings.conflict_policy.parse()?;
        let config = Self {
            max_retries: settings.max_retries,
            remote_timeout: settings.remote_timeout_ms.map(Duration::from_millis),
            auto_sync_interval: settings.auto_sync_interval_secs.map(Duration::from_secs),
            conflict_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_retries == 0 {
            return Err(crate::SyncError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.remote_timeout == Some(Duration::ZERO) {
            return Err(crate::SyncError::Config(
                "remote_timeout must be greater than zero".to_string(),
            ));
        }
        if self.auto_sync_interval == Some(Duration::ZERO) {
            return Err(crate::SyncError::Config(
                "auto_sync_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
