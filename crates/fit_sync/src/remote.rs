//! Remote store seam.
//!
//! The backend SDK lives outside this crate; an adapter implements
//! [`RemoteStore`] over it. Tests use scripted implementations.

use futures_util::future::BoxFuture;

use crate::action::Record;

/// Error type for remote store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (offline, DNS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with an error.
    #[error("server rejected request on {table}: {message}")]
    Rejected { table: String, message: String },
}

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Table-oriented CRUD against the remote backend.
pub trait RemoteStore: Send + Sync {
    /// Insert `record` into `table`.
    fn insert<'a>(&'a self, table: &'a str, record: &'a Record) -> BoxFuture<'a, RemoteResult<()>>;

    /// Update the row of `table` whose id equals `id` with `record`.
    fn update<'a>(
        &'a self,
        table: &'a str,
        record: &'a Record,
        id: &'a str,
    ) -> BoxFuture<'a, RemoteResult<()>>;

    /// Delete the row of `table` whose id equals `id`.
    fn delete<'a>(&'a self, table: &'a str, id: &'a str) -> BoxFuture<'a, RemoteResult<()>>;

    /// Fetch the single row of `table` whose id equals `id`.
    fn select<'a>(
        &'a self,
        table: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, RemoteResult<Option<Record>>>;
}
