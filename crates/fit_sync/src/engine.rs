//! Sync engine orchestration
//!
//! One engine instance owns the action queue. Drains are serialized by the
//! `is_syncing` flag, which is checked and set inside a single critical
//! section; remote calls happen with no lock held, so other work (enqueues,
//! connectivity reports, state reads) proceeds while a drain is in flight.

use std::future::Future;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::action::{ActionType, NewAction, SyncAction};
use crate::broadcast::{StateBroadcaster, SyncState};
use crate::config::SyncConfig;
use crate::network::{NetworkSignal, NetworkStatus};
use crate::queue::ActionQueue;
use crate::remote::RemoteStore;
use crate::resolver::{ConflictPolicy, ConflictResolver};
use crate::store::DurableStore;
use crate::subscription::{lock, Subscription};
use crate::SyncError;

/// Main sync engine. Cheap to clone; clones drive the same engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: SyncConfig,
    queue: tokio::sync::Mutex<ActionQueue>,
    remote: Arc<dyn RemoteStore>,
    resolver: ConflictResolver,
    state: Mutex<SyncState>,
    broadcaster: StateBroadcaster,
    network: Mutex<Option<Subscription>>,
    auto_sync: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

impl SyncEngine {
    /// Create the engine: restore the persisted queue, then subscribe to
    /// `network`.
    ///
    /// Must be called from within a tokio runtime; connectivity-triggered
    /// drains are spawned onto it.
    pub async fn new(
        config: SyncConfig,
        store: Arc<dyn DurableStore>,
        remote: Arc<dyn RemoteStore>,
        network: &dyn NetworkSignal,
    ) -> crate::Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| SyncError::Runtime(e.to_string()))?;

        let mut queue = ActionQueue::new(store);
        queue.load().await;

        let state = SyncState {
            pending_actions: queue.len(),
            ..SyncState::default()
        };

        let engine = Self {
            inner: Arc::new(EngineInner {
                config,
                queue: tokio::sync::Mutex::new(queue),
                remote,
                resolver: ConflictResolver::new(),
                state: Mutex::new(state),
                broadcaster: StateBroadcaster::new(),
                network: Mutex::new(None),
                auto_sync: Mutex::new(None),
                runtime,
            }),
        };

        let weak = Arc::downgrade(&engine.inner);
        let subscription = network.subscribe(Arc::new(move |status: &NetworkStatus| {
            handle_network(&weak, status);
        }));
        *lock(&engine.inner.network) = Some(subscription);

        if let Some(interval) = engine.inner.config.auto_sync_interval {
            engine.start_auto_sync(interval);
        }

        tracing::info!(
            "Sync engine ready with {} pending actions",
            engine.state().pending_actions
        );
        Ok(engine)
    }

    /// Queue a mutation and, if online, drain.
    ///
    /// Never fails because of downstream sync problems; the returned action
    /// is the queued copy with its assigned id.
    pub async fn queue_action(&self, action: NewAction) -> SyncAction {
        let queued = {
            let mut queue = self.inner.queue.lock().await;
            let queued = queue.enqueue(action).await;
            self.set_pending(queue.len());
            queued
        };

        if self.state().is_online {
            self.sync().await;
        }
        queued
    }

    /// Register `callback` for state changes. It runs immediately with the
    /// current state, then with every new state.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&SyncState) + Send + Sync + 'static,
    {
        let subscription = {
            let state = lock(&self.inner.state);
            self.inner.broadcaster.register(&state, callback)
        };
        self.inner.broadcaster.flush();
        subscription
    }

    /// Current state snapshot.
    pub fn state(&self) -> SyncState {
        lock(&self.inner.state).clone()
    }

    /// Copy of the queued actions, in queue order.
    pub async fn pending_actions(&self) -> Vec<SyncAction> {
        self.inner.queue.lock().await.snapshot()
    }

    /// Run one drain cycle over the queue as it is now.
    ///
    /// No-op while offline or while another drain is running. Resolves
    /// after the cycle even if every action failed.
    pub async fn sync(&self) {
        {
            let mut state = lock(&self.inner.state);
            if state.is_syncing || !state.is_online {
                tracing::debug!(
                    "Skipping drain (syncing: {}, online: {})",
                    state.is_syncing,
                    state.is_online
                );
                return;
            }
            state.is_syncing = true;
            self.inner.broadcaster.stage(&state);
        }
        self.inner.broadcaster.flush();

        let snapshot = self.inner.queue.lock().await.snapshot();
        if !snapshot.is_empty() {
            tracing::info!("Syncing {} pending actions", snapshot.len());
        }

        for action in snapshot {
            self.process(action).await;
        }

        let pending = {
            let mut state = lock(&self.inner.state);
            state.is_syncing = false;
            state.last_sync_time = Some(chrono::Utc::now().timestamp_millis());
            self.inner.broadcaster.stage(&state);
            state.pending_actions
        };
        tracing::debug!("Drain finished, {} actions pending", pending);
        self.inner.broadcaster.flush();
    }

    /// Run `sync` every `interval` until the engine is dropped.
    fn start_auto_sync(&self, interval: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let task = self.inner.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                SyncEngine { inner }.sync().await;
            }
        });

        tracing::info!("Auto-sync every {:?}", interval);
        *lock(&self.inner.auto_sync) = Some(task);
    }

    async fn process(&self, action: SyncAction) {
        match self.apply(&action).await {
            Ok(()) => {
                tracing::debug!("Synced {} {} on {}", action.action_type, action.id, action.table);
                let mut queue = self.inner.queue.lock().await;
                queue.remove(&action.id).await;
                self.set_pending(queue.len());
            }
            Err(err) => self.fail(action, err).await,
        }
    }

    async fn apply(&self, action: &SyncAction) -> crate::Result<()> {
        let remote = self.inner.remote.as_ref();
        let table = action.table.as_str();

        match action.action_type {
            ActionType::Create => self.timed(remote.insert(table, &action.data)).await,
            ActionType::Update => {
                let id = required_id(action)?;
                self.timed(self.inner.resolver.check(remote, table, &action.data))
                    .await?;
                self.timed(remote.update(table, &action.data, &id)).await
            }
            ActionType::Delete => {
                let id = required_id(action)?;
                self.timed(remote.delete(table, &id)).await
            }
        }
    }

    async fn fail(&self, action: SyncAction, err: SyncError) {
        let mut queue = self.inner.queue.lock().await;
        let retry_count = match queue.get(&action.id) {
            Some(live) => live.retry_count,
            None => return,
        };

        let skip_retry = matches!(err, SyncError::Conflict)
            && self.inner.config.conflict_policy == ConflictPolicy::DeadLetter;

        if !skip_retry && retry_count < self.inner.config.max_retries {
            let attempt = queue.bump_retry(&action.id).await.unwrap_or(retry_count);
            tracing::warn!(
                "Sync of {} {} failed (attempt {}/{}): {}",
                action.action_type,
                action.id,
                attempt,
                self.inner.config.max_retries,
                err
            );
        } else {
            tracing::warn!(
                "Dead-lettering {} {} on {} after {} retries: {}",
                action.action_type,
                action.id,
                action.table,
                retry_count,
                err
            );
            let Some(live) = queue.get(&action.id).cloned() else {
                return;
            };
            if let Err(e) = queue.dead_letter(&live, &err.to_string()).await {
                // keep it queued so the next drain retries the write
                tracing::warn!(
                    "Failed to write dead-letter for {}, keeping it queued: {}",
                    action.id,
                    e
                );
                return;
            }
            queue.remove(&action.id).await;
        }

        self.set_pending(queue.len());
    }

    /// Apply the configured remote timeout to `fut`.
    async fn timed<T, E, F>(&self, fut: F) -> crate::Result<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<SyncError>,
    {
        match self.inner.config.remote_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(SyncError::Timeout(limit)),
            },
            None => fut.await.map_err(Into::into),
        }
    }

    fn set_pending(&self, pending: usize) {
        {
            let mut state = lock(&self.inner.state);
            if state.pending_actions == pending {
                return;
            }
            state.pending_actions = pending;
            self.inner.broadcaster.stage(&state);
        }
        self.inner.broadcaster.flush();
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        if let Some(subscription) = lock(&self.network).take() {
            subscription.unsubscribe();
        }
        if let Some(task) = lock(&self.auto_sync).take() {
            task.abort();
        }
    }
}

fn required_id(action: &SyncAction) -> crate::Result<String> {
    action.record_id().ok_or_else(|| SyncError::MissingId {
        action: action.action_type,
        table: action.table.clone(),
    })
}

/// React to a connectivity report: record it, publish it, and start a drain
/// when the engine comes online.
fn handle_network(weak: &Weak<EngineInner>, status: &NetworkStatus) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let online = status.is_online();
    {
        let mut state = lock(&inner.state);
        if state.is_online == online {
            return;
        }
        state.is_online = online;
        inner.broadcaster.stage(&state);
    }

    tracing::info!("Connectivity changed: online = {}", online);
    inner.broadcaster.flush();

    if online {
        let runtime = inner.runtime.clone();
        let engine = SyncEngine { inner };
        runtime.spawn(async move {
            engine.sync().await;
        });
    }
}
