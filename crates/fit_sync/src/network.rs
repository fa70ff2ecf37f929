//! Connectivity signal.
//!
//! The host platform reports connectivity transitions; the engine only
//! consumes them through [`NetworkSignal`].

use std::sync::{Arc, Mutex};

use crate::subscription::{lock, Listeners, Subscription};

/// Connectivity report. `None` means the platform could not tell, which
/// the engine treats as offline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStatus {
    pub is_connected: Option<bool>,
}

impl NetworkStatus {
    pub fn online() -> Self {
        Self {
            is_connected: Some(true),
        }
    }

    pub fn offline() -> Self {
        Self {
            is_connected: Some(false),
        }
    }

    pub fn is_online(&self) -> bool {
        self.is_connected.unwrap_or(false)
    }
}

/// Callback type delivered connectivity reports.
pub type NetworkCallback = Arc<dyn Fn(&NetworkStatus) + Send + Sync>;

/// Source of connectivity transitions.
pub trait NetworkSignal: Send + Sync {
    /// Register `callback` for connectivity reports.
    fn subscribe(&self, callback: NetworkCallback) -> Subscription;
}

/// In-process signal driven by the host through [`NetworkMonitor::set_connected`].
///
/// New subscribers immediately receive the current status, mirroring how
/// platform connectivity APIs report the initial state. Clones share state.
#[derive(Clone)]
pub struct NetworkMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    status: Mutex<NetworkStatus>,
    listeners: Listeners<NetworkStatus>,
}

impl NetworkMonitor {
    /// Monitor with unknown connectivity.
    pub fn new() -> Self {
        Self::with_status(NetworkStatus::default())
    }

    pub fn with_status(status: NetworkStatus) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                status: Mutex::new(status),
                listeners: Listeners::new(),
            }),
        }
    }

    /// Record a platform report and notify subscribers if it changed.
    pub fn set_connected(&self, is_connected: Option<bool>) {
        let status = NetworkStatus { is_connected };
        {
            let mut current = lock(&self.inner.status);
            if *current == status {
                return;
            }
            *current = status;
            self.inner.listeners.stage(status);
        }

        if status.is_online() {
            tracing::info!("Network: online");
        } else {
            tracing::warn!("Network: offline ({:?})", is_connected);
        }
        self.inner.listeners.flush();
    }

    pub fn current_status(&self) -> NetworkStatus {
        *lock(&self.inner.status)
    }

    pub fn is_online(&self) -> bool {
        self.current_status().is_online()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSignal for NetworkMonitor {
    fn subscribe(&self, callback: NetworkCallback) -> Subscription {
        let subscription = {
            let current = lock(&self.inner.status);
            self.inner.listeners.add_with_replay(callback, *current)
        };
        self.inner.listeners.flush();
        subscription
    }
}
