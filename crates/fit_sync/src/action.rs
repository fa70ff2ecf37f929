//! Queued mutation intents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A record as exchanged with the remote store: a JSON object
pub type Record = Map<String, Value>;

/// Kind of mutation an action applies to its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Create => "CREATE",
            ActionType::Update => "UPDATE",
            ActionType::Delete => "DELETE",
        };
        f.pad(name)
    }
}

/// Caller-supplied part of an action, before the queue assigns identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub table: String,
    pub data: Record,
}

impl NewAction {
    pub fn new(action_type: ActionType, table: impl Into<String>, data: Record) -> Self {
        Self {
            action_type,
            table: table.into(),
            data,
        }
    }

    pub fn create(table: impl Into<String>, data: Record) -> Self {
        Self::new(ActionType::Create, table, data)
    }

    pub fn update(table: impl Into<String>, data: Record) -> Self {
        Self::new(ActionType::Update, table, data)
    }

    pub fn delete(table: impl Into<String>, data: Record) -> Self {
        Self::new(ActionType::Delete, table, data)
    }
}

/// A pending mutation as it sits in the queue and in durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAction {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub table: String,
    pub data: Record,
    /// Milliseconds since the Unix epoch at enqueue time
    pub timestamp: i64,
    #[serde(default)]
    pub retry_count: u32,
}

impl SyncAction {
    /// Build a fresh action with a new id, the current time and no retries
    pub fn from_new(action: NewAction) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_type: action.action_type,
            table: action.table,
            data: action.data,
            timestamp: chrono::Utc::now().timestamp_millis(),
            retry_count: 0,
        }
    }

    /// The `id` field of the payload, if it carries a usable one
    pub fn record_id(&self) -> Option<String> {
        record_id(&self.data)
    }
}

/// Extract a match id from a record's `id` field
///
/// Strings are taken as-is and numbers are rendered in decimal. Anything
/// else (missing, null, empty string, objects) yields `None`.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_wire_format() {
        let action = SyncAction {
            id: "a1".to_string(),
            action_type: ActionType::Update,
            table: "workouts".to_string(),
            data: record(json!({"id": "w1", "reps": 12})),
            timestamp: 1_700_000_000_000,
            retry_count: 2,
        };

        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a1",
                "type": "UPDATE",
                "table": "workouts",
                "data": {"id": "w1", "reps": 12},
                "timestamp": 1_700_000_000_000_i64,
                "retryCount": 2
            })
        );
    }

    #[test]
    fn test_missing_retry_count_defaults_to_zero() {
        let action: SyncAction = serde_json::from_value(json!({
            "id": "a1",
            "type": "DELETE",
            "table": "meals",
            "data": {"id": 7},
            "timestamp": 1
        }))
        .unwrap();
        assert_eq!(action.retry_count, 0);
        assert_eq!(action.record_id().as_deref(), Some("7"));
    }

    #[test]
    fn test_from_new_assigns_identity() {
        let first = SyncAction::from_new(NewAction::create("test", record(json!({"name": "test"}))));
        let second = SyncAction::from_new(NewAction::create("test", record(json!({"name": "test"}))));

        assert_ne!(first.id, second.id);
        assert_eq!(first.retry_count, 0);
        assert!(first.timestamp > 0);
        assert_eq!(first.action_type, ActionType::Create);
    }

    #[test]
    fn test_record_id_rejects_unusable_values() {
        assert_eq!(record_id(&record(json!({}))), None);
        assert_eq!(record_id(&record(json!({"id": null}))), None);
        assert_eq!(record_id(&record(json!({"id": ""}))), None);
        assert_eq!(record_id(&record(json!({"id": {"nested": 1}}))), None);
        assert_eq!(record_id(&record(json!({"id": "123"}))).as_deref(), Some("123"));
    }
}
