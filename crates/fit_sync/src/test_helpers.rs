//! Shared test helpers for the engine's unit tests.

use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::action::{record_id, Record};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::store::{DurableStore, MemoryStore, StoreError, StoreResult};

/// Build a record from a `json!` object literal.
pub fn record(value: Value) -> Record {
    value.as_object().cloned().expect("record literal must be an object")
}

/// In-memory remote that logs every call and can be told to fail or stall.
#[derive(Default)]
pub struct ScriptedRemote {
    rows: Mutex<HashMap<(String, String), Record>>,
    calls: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_row(&self, table: &str, row: Record) {
        let id = record_id(&row).expect("row needs an id");
        self.rows.lock().unwrap().insert((table.to_string(), id), row);
    }

    pub fn row(&self, table: &str, id: &str) -> Option<Record> {
        self.rows
            .lock()
            .unwrap()
            .get(&(table.to_string(), id.to_string()))
            .cloned()
    }

    /// Make every subsequent call fail with a network error.
    pub fn fail_all(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Block every subsequent call until permits are added to the returned
    /// semaphore.
    pub fn pause(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) -> RemoteResult<()> {
        self.calls.lock().unwrap().push(call);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(RemoteError::Network(message)),
            None => Ok(()),
        }
    }
}

impl RemoteStore for ScriptedRemote {
    fn insert<'a>(&'a self, table: &'a str, record: &'a Record) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            self.enter(format!("insert {}", table)).await?;
            if let Some(id) = record_id(record) {
                self.put_row(table, record.clone());
                tracing::trace!("inserted {}/{}", table, id);
            }
            Ok(())
        })
    }

    fn update<'a>(
        &'a self,
        table: &'a str,
        record: &'a Record,
        id: &'a str,
    ) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            self.enter(format!("update {} {}", table, id)).await?;
            self.rows
                .lock()
                .unwrap()
                .insert((table.to_string(), id.to_string()), record.clone());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            self.enter(format!("delete {} {}", table, id)).await?;
            self.rows
                .lock()
                .unwrap()
                .remove(&(table.to_string(), id.to_string()));
            Ok(())
        })
    }

    fn select<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, RemoteResult<Option<Record>>> {
        Box::pin(async move {
            self.enter(format!("select {} {}", table, id)).await?;
            Ok(self.row(table, id))
        })
    }
}

/// Memory store whose reads and writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    rejected_prefix: Arc<Mutex<Option<String>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail writes to keys starting with `prefix`.
    pub fn reject_prefix(&self, prefix: &str) {
        *self.rejected_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn accept_all(&self) {
        *self.rejected_prefix.lock().unwrap() = None;
    }

    fn check_key(&self, key: &str) -> StoreResult<()> {
        match self.rejected_prefix.lock().unwrap().as_deref() {
            Some(prefix) if key.starts_with(prefix) => {
                Err(StoreError::Backend(format!("write to {} rejected", key)))
            }
            _ => Ok(()),
        }
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Backend("disk unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DurableStore for FlakyStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        Box::pin(async move {
            Self::check(&self.fail_reads)?;
            self.inner.get(key).await
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            Self::check(&self.fail_writes)?;
            self.check_key(key)?;
            self.inner.set(key, value).await
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            Self::check(&self.fail_writes)?;
            self.inner.remove(key).await
        })
    }
}
