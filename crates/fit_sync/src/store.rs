//! Durable key-value persistence
//!
//! The engine only needs string values under string keys. [`MemoryStore`]
//! keeps them in process; [`FileStore`] keeps one file per key in a
//! directory and replaces files atomically so a crash mid-write leaves the
//! previous value intact.

use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;

/// Error type for durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by a platform storage backend.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for durable store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Async string-keyed persistence.
///
/// Each call may fail independently; callers decide whether a failure is
/// fatal.
pub trait DurableStore: Send + Sync {
    /// Read the value under `key`, `None` if absent.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>>;

    /// Delete `key`. Removing an absent key succeeds.
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>>;
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value under `key` without going through the async API.
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DurableStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        Box::pin(async move { Ok(self.value(key)) })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.lock().insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.lock().remove(key);
            Ok(())
        })
    }
}

const ENTRY_EXT: &str = "entry";
const TEMP_EXT: &str = "tmp";

/// Directory-backed store, one `<encoded key>.entry` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All keys currently stored, sorted. Files that do not decode to a key
    /// (including in-flight temp files) are skipped.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", encode_key(key), ENTRY_EXT))
    }
}

impl DurableStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<Option<String>>> {
        Box::pin(async move {
            match tokio::fs::read_to_string(self.path_for(key)).await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let path = self.path_for(key);
            let temp = path.with_extension(TEMP_EXT);

            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp, &path).await?;

            tracing::trace!("Wrote store entry {:?}", path);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            match tokio::fs::remove_file(self.path_for(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}

/// Percent-encode a key into a portable file name.
fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(encoded: &str) -> Option<String> {
    urlencoding::decode(encoded).ok().map(|key| key.into_owned())
}
