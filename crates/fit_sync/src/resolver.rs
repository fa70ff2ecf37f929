//! Conflict detection for queued updates
//!
//! Coarse last-writer-wins: before an update is applied, the remote row is
//! fetched and the update is refused when the server copy is strictly newer.
//! There is no field-level merge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::action::{record_id, Record};
use crate::remote::RemoteStore;
use crate::SyncError;

/// Timestamp field compared between local and remote records
pub const UPDATED_AT: &str = "updated_at";

/// How the engine routes a conflict failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Consume a retry like any other failure
    Retry,

    /// Dead-letter on the first conflict
    DeadLetter,
}

impl FromStr for ConflictPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retry" => Ok(ConflictPolicy::Retry),
            "dead-letter" => Ok(ConflictPolicy::DeadLetter),
            other => Err(SyncError::Config(format!(
                "unknown conflict_policy {:?} (expected \"retry\" or \"dead-letter\")",
                other
            ))),
        }
    }
}

/// Conflict resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Check `local` against the current remote copy in `table`
    ///
    /// Returns [`SyncError::Conflict`] when the remote row exists and its
    /// `updated_at` is strictly newer than the local one. A record without
    /// a usable `id` fails with [`SyncError::MissingId`].
    pub async fn check(
        &self,
        remote: &dyn RemoteStore,
        table: &str,
        local: &Record,
    ) -> crate::Result<()> {
        let id = record_id(local).ok_or_else(|| SyncError::MissingId {
            action: crate::ActionType::Update,
            table: table.to_string(),
        })?;

        let Some(server) = remote.select(table, &id).await? else {
            tracing::debug!("No remote row for {}/{}, nothing to conflict with", table, id);
            return Ok(());
        };

        let local_ts = timestamp_millis(local.get(UPDATED_AT));
        let server_ts = timestamp_millis(server.get(UPDATED_AT));

        if server_ts > local_ts {
            tracing::warn!(
                "Conflict on {}/{}: server {} newer than local {}",
                table,
                id,
                server_ts,
                local_ts
            );
            return Err(SyncError::Conflict);
        }

        Ok(())
    }
}

/// Interpret an `updated_at` value as milliseconds since the epoch
///
/// Accepts RFC 3339 strings, `YYYY-MM-DD HH:MM:SS[.f]` (UTC), bare dates,
/// integer milliseconds and numeric strings. Anything else, including a
/// missing value, counts as 0.
pub fn timestamp_millis(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_timestamp(s).unwrap_or(0),
        _ => 0,
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }
    s.parse::<i64>().ok()
}
