//! Queue entries: one analysis task per block.

use std::fmt;
use std::str::FromStr;

use oa_schema::{FieldKind, FieldSpec, SchemaError, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::temporal::{serde_utc, Timestamp};

/// Field table for queue log lines.
pub static QUEUE_ENTRY_SHAPE: Shape = Shape {
    name: "queue_entry",
    fields: &[
        FieldSpec::new("id", FieldKind::String),
        FieldSpec::new("block_id", FieldKind::String),
        FieldSpec::new("block_path", FieldKind::String),
        FieldSpec::new("lng", FieldKind::String),
        FieldSpec::new("prompt_template", FieldKind::String),
        FieldSpec::new(
            "status",
            FieldKind::OneOf(&["pending", "in_progress", "done", "error"]),
        ),
        FieldSpec::new("priority", FieldKind::Integer),
        FieldSpec::new("created_at", FieldKind::Timestamp),
        FieldSpec::new("completed_at", FieldKind::Nullable(&FieldKind::Timestamp)),
        FieldSpec::new("result_path", FieldKind::Nullable(&FieldKind::String)),
        FieldSpec::new("error_path", FieldKind::Nullable(&FieldKind::String)),
        FieldSpec::new("error_msg", FieldKind::Nullable(&FieldKind::String)),
    ],
};

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Error,
}

impl TaskStatus {
    /// `done` and `error` absorb every further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            other => Err(TypeError::UnknownTaskStatus(other.to_string())),
        }
    }
}

/// A unit of work describing one block awaiting, undergoing, or having
/// completed analysis.
///
/// Field order matches the on-disk line layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueEntry {
    pub id: String,
    /// Reference to the analysed block (not ownership).
    pub block_id: String,
    pub block_path: String,
    pub lng: String,
    pub prompt_template: String,
    pub status: TaskStatus,
    /// Higher is more urgent.
    pub priority: i64,
    #[serde(deserialize_with = "serde_utc::deserialize")]
    pub created_at: Timestamp,
    #[serde(deserialize_with = "serde_utc::option::deserialize")]
    pub completed_at: Option<Timestamp>,
    pub result_path: Option<String>,
    pub error_path: Option<String>,
    pub error_msg: Option<String>,
}

impl QueueEntry {
    /// A fresh `pending` entry.
    pub fn pending(
        id: impl Into<String>,
        block_id: impl Into<String>,
        block_path: impl Into<String>,
        lng: impl Into<String>,
        prompt_template: impl Into<String>,
        priority: i64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            block_id: block_id.into(),
            block_path: block_path.into(),
            lng: lng.into(),
            prompt_template: prompt_template.into(),
            status: TaskStatus::Pending,
            priority,
            created_at,
            completed_at: None,
            result_path: None,
            error_path: None,
            error_msg: None,
        }
    }

    /// Validate a raw record against [`QUEUE_ENTRY_SHAPE`] and convert it.
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        oa_schema::parse(value, &QUEUE_ENTRY_SHAPE)
    }

    /// Describe the first way the completion fields disagree with `status`.
    ///
    /// `completed_at` and `result_path` are set exactly when the task is
    /// `done`; `completed_at` and `error_path` exactly when it is `error`.
    pub fn lifecycle_issue(&self) -> Option<String> {
        let completed = self.completed_at.is_some();
        let result = self.result_path.is_some();
        let error = self.error_path.is_some();
        match self.status {
            TaskStatus::Done if !completed || !result || error => Some(format!(
                "done task needs completed_at and result_path only (completed_at={completed}, result_path={result}, error_path={error})"
            )),
            TaskStatus::Error if !completed || !error || result => Some(format!(
                "error task needs completed_at and error_path only (completed_at={completed}, error_path={error}, result_path={result})"
            )),
            TaskStatus::Pending | TaskStatus::InProgress if completed || result || error => Some(format!(
                "{} task must not carry completion fields",
                self.status
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::temporal::parse_timestamp;

    fn raw() -> Value {
        json!({
            "id": "t-1",
            "block_id": "doc-0001",
            "block_path": "Archive/Blocks/doc-0001.json",
            "lng": "en",
            "prompt_template": "default",
            "status": "pending",
            "priority": 5,
            "created_at": "2024-01-01T00:00:00Z",
            "completed_at": null,
            "result_path": null,
            "error_path": null,
            "error_msg": null
        })
    }

    #[test]
    fn parses_pending_entry() {
        let entry = QueueEntry::from_value(raw()).unwrap();
        assert_eq!(entry.status, TaskStatus::Pending);
        assert_eq!(entry.priority, 5);
        assert!(entry.lifecycle_issue().is_none());
    }

    #[test]
    fn nullable_fields_must_be_present() {
        let mut v = raw();
        v.as_object_mut().unwrap().remove("error_msg");
        let err = QueueEntry::from_value(v).unwrap_err();
        assert!(err.to_string().contains("error_msg"));
    }

    #[test]
    fn serializes_nulls_and_field_order() {
        let entry = QueueEntry::from_value(raw()).unwrap();
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.starts_with(r#"{"id":"t-1","block_id":"doc-0001""#));
        assert!(line.ends_with(r#""completed_at":null,"result_path":null,"error_path":null,"error_msg":null}"#));
        assert!(line.contains(r#""created_at":"2024-01-01T00:00:00Z""#));
    }

    #[test]
    fn lifecycle_issue_detects_half_finished_done() {
        let mut entry = QueueEntry::from_value(raw()).unwrap();
        entry.status = TaskStatus::Done;
        assert!(entry.lifecycle_issue().is_some());
        entry.completed_at = Some(parse_timestamp("2024-01-02T00:00:00Z").unwrap());
        entry.result_path = Some("r.json".into());
        assert!(entry.lifecycle_issue().is_none());
        entry.error_path = Some("e.json".into());
        assert!(entry.lifecycle_issue().is_some());
    }

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("finished".parse::<TaskStatus>().is_err());
    }
}
