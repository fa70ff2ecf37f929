//! # FitSync Engine
//!
//! Offline-first synchronization of local mutations against a remote,
//! table-oriented backend.
//!
//! ## Architecture
//!
//! - **Queue**: pending actions persisted to a [`DurableStore`] after every change
//! - **Engine**: drains the queue against a [`RemoteStore`] when online, with
//!   bounded retries and dead-lettering
//! - **Resolver**: refuses updates when the server copy is newer
//! - **Broadcaster**: publishes [`SyncState`] to UI subscribers
//! - **Network**: connectivity reports arrive through a [`NetworkSignal`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fit_sync::{FileStore, NetworkMonitor, NewAction, RemoteStore, SyncConfig, SyncEngine};
//!
//! async fn run(remote: Arc<dyn RemoteStore>) -> fit_sync::Result<()> {
//!     let store = Arc::new(FileStore::open(".fitsync/store")?);
//!     let network = NetworkMonitor::new();
//!     let engine = SyncEngine::new(SyncConfig::default(), store, remote, &network).await?;
//!
//!     let _status = engine.subscribe(|state| {
//!         println!("{} changes pending", state.pending_actions);
//!     });
//!
//!     let data = serde_json::json!({"name": "Morning run", "distance_km": 5.2});
//!     let data = data.as_object().cloned().unwrap_or_default();
//!     engine.queue_action(NewAction::create("workouts", data)).await;
//!
//!     network.set_connected(Some(true));
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod network;
pub mod queue;
pub mod remote;
pub mod resolver;
pub mod store;
pub mod subscription;

#[cfg(test)]
mod test_helpers;

pub use action::{ActionType, NewAction, Record, SyncAction};
pub use broadcast::{StateBroadcaster, SyncState};
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use network::{NetworkCallback, NetworkMonitor, NetworkSignal, NetworkStatus};
pub use queue::{dead_letter_key, ActionQueue, DeadLetter, DEAD_LETTER_PREFIX, QUEUE_KEY};
pub use remote::{RemoteError, RemoteResult, RemoteStore};
pub use resolver::{ConflictPolicy, ConflictResolver};
pub use store::{DurableStore, FileStore, MemoryStore, StoreError, StoreResult};
pub use subscription::Subscription;

/// Common result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during sync operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// The server copy is newer than the local update.
    #[error("Conflict: Server has newer data")]
    Conflict,

    #[error("{action} on {table} requires an `id` field")]
    MissingId { action: ActionType, table: String },

    #[error("Remote call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No tokio runtime available: {0}")]
    Runtime(String),
}
