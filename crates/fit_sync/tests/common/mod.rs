//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use fit_sync::{
    DurableStore, MemoryStore, Record, RemoteError, RemoteResult, RemoteStore, StoreResult,
    SyncEngine,
};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

/// Memory store that records every write.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingStore {
    pub fn writes_to(&self, key: &str) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl DurableStore for RecordingStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        self.inner.get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone()));
        self.inner.set(key, value)
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        self.inner.remove(key)
    }
}

/// Remote backed by a map of rows; inserts can be made to always fail.
#[derive(Default)]
pub struct MockRemote {
    rows: Mutex<HashMap<(String, String), Record>>,
    calls: Mutex<Vec<String>>,
    reject_inserts: Mutex<bool>,
}

impl MockRemote {
    pub fn reject_inserts(&self) {
        *self.reject_inserts.lock().unwrap() = true;
    }

    pub fn seed(&self, table: &str, id: &str, row: Record) {
        self.rows
            .lock()
            .unwrap()
            .insert((table.to_string(), id.to_string()), row);
    }

    pub fn row(&self, table: &str, id: &str) -> Option<Record> {
        self.rows
            .lock()
            .unwrap()
            .get(&(table.to_string(), id.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(verb)).count()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RemoteStore for MockRemote {
    fn insert<'a>(&'a self, table: &'a str, _record: &'a Record) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            self.log(format!("insert {}", table));
            if *self.reject_inserts.lock().unwrap() {
                return Err(RemoteError::Rejected {
                    table: table.to_string(),
                    message: "permission denied".to_string(),
                });
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
            self.log(format!("update {} {}", table, id));
            self.seed(table, id, record.clone());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BoxFuture<'a, RemoteResult<()>> {
        Box::pin(async move {
            self.log(format!("delete {} {}", table, id));
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
            self.log(format!("select {} {}", table, id));
            Ok(self.row(table, id))
        })
    }
}

/// Wait until the engine has finished at least one drain and is idle.
pub async fn wait_for_drain(engine: &SyncEngine) {
    for _ in 0..400 {
        let state = engine.state();
        if !state.is_syncing && state.last_sync_time.is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no drain completed in time");
}
