//! Domain types and record-store DTOs.
//!
//! # Design
//! The record store wraps every row as `{id, createdTime, fields}` and drops
//! `false` and empty values from `fields`. The wire DTOs mirror that shape
//! with optional fields; `Todo` is the flattened local form with the
//! defaults applied. `record-server` defines its own copies of the wire
//! shape so integration tests catch schema drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A to-do as held in local state. `id` always comes from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// A to-do that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_completed: false,
        }
    }
}

/// The `fields` object of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

/// A record as returned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: RecordFields,
}

impl From<Record> for Todo {
    fn from(record: Record) -> Self {
        Todo {
            id: record.id,
            title: record.fields.title.unwrap_or_default(),
            is_completed: record.fields.is_completed.unwrap_or(false),
            created_time: record.created_time,
        }
    }
}

/// Response envelope shared by list, create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordList {
    pub records: Vec<Record>,
}

/// One entry of a create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub fields: RecordFields,
}

/// One entry of an update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub id: String,
    pub fields: RecordFields,
}

/// Request envelope for writes: `{"records": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecords<T> {
    pub records: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_without_fields_maps_to_defaults() {
        let record: Record = serde_json::from_str(r#"{"id":"rec1","fields":{}}"#).unwrap();
        let todo = Todo::from(record);
        assert_eq!(todo.id, "rec1");
        assert_eq!(todo.title, "");
        assert!(!todo.is_completed);
        assert!(todo.created_time.is_none());
    }

    #[test]
    fn record_maps_all_fields() {
        let record: Record = serde_json::from_str(
            r#"{"id":"rec2","createdTime":"2024-03-01T10:00:00.000Z","fields":{"title":"Walk dog","isCompleted":true}}"#,
        )
        .unwrap();
        let todo = Todo::from(record);
        assert_eq!(todo.title, "Walk dog");
        assert!(todo.is_completed);
        assert_eq!(
            todo.created_time.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
    }

    #[test]
    fn fields_omit_absent_values() {
        let fields = RecordFields {
            title: Some("Only title".to_string()),
            is_completed: None,
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Only title"}));
    }

    #[test]
    fn draft_defaults_to_not_completed() {
        let draft: TodoDraft = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert!(!draft.is_completed);
        assert!(!TodoDraft::new("y").is_completed);
    }
}
