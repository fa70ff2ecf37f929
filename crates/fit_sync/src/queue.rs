//! Durable queue of pending actions.
//!
//! The whole queue is re-serialized under [`QUEUE_KEY`] after every
//! mutation. Persistence is best-effort: load and save failures are logged
//! and the in-memory list stays authoritative for the running process.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::action::{NewAction, SyncAction};
use crate::store::{DurableStore, StoreError, StoreResult};

/// Key holding the JSON array of queued actions.
pub const QUEUE_KEY: &str = "@sync_queue";

/// Prefix of per-action dead-letter keys.
pub const DEAD_LETTER_PREFIX: &str = "@sync_failed_";

/// Key of the dead-letter record for `action_id`.
pub fn dead_letter_key(action_id: &str) -> String {
    format!("{}{}", DEAD_LETTER_PREFIX, action_id)
}

/// Terminal record of an action that ran out of retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub action: SyncAction,
    pub error: String,
}

impl DeadLetter {
    /// Read the dead-letter record for `action_id`, for inspection tools.
    pub async fn load(store: &dyn DurableStore, action_id: &str) -> crate::Result<Option<Self>> {
        match store.get(&dead_letter_key(action_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// Ordered, persisted list of pending actions.
pub struct ActionQueue {
    actions: Vec<SyncAction>,
    store: Arc<dyn DurableStore>,
}

impl ActionQueue {
    /// Empty queue over `store`. Call [`ActionQueue::load`] to restore state.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            actions: Vec::new(),
            store,
        }
    }

    /// Restore the persisted queue, falling back to empty on any failure.
    pub async fn load(&mut self) {
        let raw = match self.store.get(QUEUE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No persisted queue found, starting fresh");
                self.actions.clear();
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to read persisted queue: {}", e);
                self.actions.clear();
                return;
            }
        };

        match serde_json::from_str::<Vec<SyncAction>>(&raw) {
            Ok(actions) => {
                tracing::info!("Loaded {} pending actions", actions.len());
                self.actions = actions;
            }
            Err(e) => {
                tracing::warn!("Persisted queue is corrupt, starting empty: {}", e);
                self.actions.clear();
            }
        }
    }

    /// Persist the full list. Failures are logged, not returned.
    pub async fn save(&self) {
        let json = match serde_json::to_string(&self.actions) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize queue: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(QUEUE_KEY, json).await {
            tracing::warn!("Failed to persist queue of {} actions: {}", self.actions.len(), e);
        }
    }

    /// Append a fresh action built from `action` and persist.
    pub async fn enqueue(&mut self, action: NewAction) -> SyncAction {
        let action = SyncAction::from_new(action);
        tracing::debug!(
            "Queued {} on {} as {}",
            action.action_type,
            action.table,
            action.id
        );

        self.actions.push(action.clone());
        self.save().await;
        action
    }

    /// Remove the action with `id` and persist. Returns the removed action.
    pub async fn remove(&mut self, id: &str) -> Option<SyncAction> {
        let index = self.actions.iter().position(|a| a.id == id)?;
        let removed = self.actions.remove(index);
        self.save().await;
        Some(removed)
    }

    /// Increment the retry count of `id` in place and persist.
    ///
    /// Returns the new count, or `None` if the action is no longer queued.
    pub async fn bump_retry(&mut self, id: &str) -> Option<u32> {
        let action = self.actions.iter_mut().find(|a| a.id == id)?;
        action.retry_count += 1;
        let count = action.retry_count;
        self.save().await;
        Some(count)
    }

    /// Write the dead-letter record for `action`.
    ///
    /// The caller must keep the action queued when this fails; the record is
    /// the only trace an exhausted action leaves.
    pub async fn dead_letter(&self, action: &SyncAction, error: &str) -> StoreResult<()> {
        let record = DeadLetter {
            action: action.clone(),
            error: error.to_string(),
        };

        let json = serde_json::to_string(&record).map_err(|e| {
            StoreError::Backend(format!("failed to serialize dead-letter: {}", e))
        })?;

        self.store.set(&dead_letter_key(&action.id), json).await
    }

    pub fn get(&self, id: &str) -> Option<&SyncAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Copy of the current queue, in order.
    pub fn snapshot(&self) -> Vec<SyncAction> {
        self.actions.clone()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
