//! Read-only views over a file-backed sync store

use anyhow::{Context, Result};
use fit_common::FitError;
use fit_sync::{DeadLetter, DurableStore, FileStore, SyncAction, DEAD_LETTER_PREFIX, QUEUE_KEY};
use std::path::Path;

/// Open the store at `dir`, or `None` when nothing has been persisted yet.
pub fn open(dir: &Path) -> Result<Option<FileStore>> {
    if !dir.exists() {
        tracing::debug!("Store directory {} does not exist", dir.display());
        return Ok(None);
    }
    let store = FileStore::open(dir)
        .with_context(|| format!("Failed to open store at {}", dir.display()))?;
    Ok(Some(store))
}

/// Queued actions in drain order.
///
/// Unlike the engine, which starts over with an empty queue, a corrupt
/// queue is reported here so it can be inspected by hand.
pub async fn pending(store: &FileStore) -> Result<Vec<SyncAction>> {
    let Some(raw) = store.get(QUEUE_KEY).await? else {
        return Ok(Vec::new());
    };
    let actions = serde_json::from_str(&raw)
        .map_err(|e| FitError::StorageError(format!("{} is not a valid queue: {}", QUEUE_KEY, e)))?;
    Ok(actions)
}

/// All dead-letter records, ordered by action id.
pub async fn dead_letters(store: &FileStore) -> Result<Vec<DeadLetter>> {
    let mut letters = Vec::new();
    for key in store.keys().await? {
        let Some(id) = key.strip_prefix(DEAD_LETTER_PREFIX) else {
            continue;
        };
        match DeadLetter::load(store, id).await {
            Ok(Some(letter)) => letters.push(letter),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable dead letter {}: {}", key, e),
        }
    }
    Ok(letters)
}

/// Delete the dead-letter record of `id`.
pub async fn purge(store: &FileStore, id: &str) -> Result<DeadLetter> {
    let letter = DeadLetter::load(store, id)
        .await?
        .ok_or_else(|| FitError::NotFound(format!("dead letter {}", id)))?;
    store.remove(&fit_sync::dead_letter_key(id)).await?;
    Ok(letter)
}
