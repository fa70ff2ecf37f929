//! Sync status feed for UI observers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::subscription::{Listeners, Subscription};

/// Snapshot of engine status, published whole on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub is_online: bool,
    pub is_syncing: bool,
    /// Milliseconds since the Unix epoch at which the last drain finished
    pub last_sync_time: Option<i64>,
    pub pending_actions: usize,
}

/// Publish/subscribe surface over [`SyncState`].
pub struct StateBroadcaster {
    listeners: Listeners<SyncState>,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    /// Register `callback`, invoking it immediately with `current`.
    pub fn subscribe<F>(&self, current: &SyncState, callback: F) -> Subscription
    where
        F: Fn(&SyncState) + Send + Sync + 'static,
    {
        let subscription = self.register(current, callback);
        self.flush();
        subscription
    }

    /// Deliver `state` to every subscriber.
    pub fn publish(&self, state: &SyncState) {
        tracing::trace!(?state, "Publishing sync state");
        self.listeners.emit(state.clone());
    }

    /// Register `callback` with `current` staged as its first state.
    ///
    /// Call while holding whatever guards `current`, then [`flush`](Self::flush).
    pub fn register<F>(&self, current: &SyncState, callback: F) -> Subscription
    where
        F: Fn(&SyncState) + Send + Sync + 'static,
    {
        self.listeners.add_with_replay(Arc::new(callback), current.clone())
    }

    /// Queue `state` behind every state staged before it.
    pub fn stage(&self, state: &SyncState) {
        tracing::trace!(?state, "Publishing sync state");
        self.listeners.stage(state.clone());
    }

    /// Deliver staged states in order.
    pub fn flush(&self) {
        self.listeners.flush();
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
