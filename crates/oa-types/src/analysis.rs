//! Analysis outputs: the per-block result record and the error record.

use std::fmt;
use std::str::FromStr;

use oa_schema::{FieldKind, FieldSpec, SchemaError, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::temporal::{serde_utc, Timestamp};

/// Maximum number of keywords in an analysis payload.
pub const MAX_KEYWORDS: usize = 12;

const STRINGS: FieldKind = FieldKind::StringList { max_items: None };

pub static SIGNALS_SHAPE: Shape = Shape {
    name: "signals",
    fields: &[
        FieldSpec::new("people", STRINGS),
        FieldSpec::new("projects", STRINGS),
        FieldSpec::new("dates", STRINGS),
    ],
};

pub static ANALYSIS_PAYLOAD_SHAPE: Shape = Shape {
    name: "analysis_payload",
    fields: &[
        FieldSpec::new("summary", FieldKind::String),
        FieldSpec::new(
            "keywords",
            FieldKind::StringList {
                max_items: Some(MAX_KEYWORDS),
            },
        ),
        FieldSpec::new("class", FieldKind::OneOf(&["gold", "useful", "rework", "trash"])),
        FieldSpec::new("signals", FieldKind::Object(&SIGNALS_SHAPE)),
        FieldSpec::new("actions", STRINGS),
        FieldSpec::new("risks", STRINGS),
        FieldSpec::new("quotes", STRINGS),
    ],
};

pub static ANALYSIS_RESULT_SHAPE: Shape = Shape {
    name: "analysis_result",
    fields: &[
        FieldSpec::new("block_id", FieldKind::String),
        FieldSpec::new("model", FieldKind::String),
        FieldSpec::new("completed_at", FieldKind::Timestamp),
        FieldSpec::new("analysis_version", FieldKind::String),
        FieldSpec::new("analysis", FieldKind::Object(&ANALYSIS_PAYLOAD_SHAPE)),
    ],
};

pub static ANALYSIS_ERROR_SHAPE: Shape = Shape {
    name: "analysis_error",
    fields: &[
        FieldSpec::new("block_id", FieldKind::String),
        FieldSpec::new("task_id", FieldKind::String),
        FieldSpec::new(
            "error_type",
            FieldKind::OneOf(&["Network", "RateLimit", "InvalidJSON", "IOError"]),
        ),
        FieldSpec::new("error_detail", FieldKind::String),
        FieldSpec::new("response_text", FieldKind::Nullable(&FieldKind::String)),
        FieldSpec::new("timestamp", FieldKind::Timestamp),
    ],
};

/// Editorial value assigned to a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisClass {
    Gold,
    Useful,
    Rework,
    Trash,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signals {
    pub people: Vec<String>,
    pub projects: Vec<String>,
    pub dates: Vec<String>,
}

/// What the analysis step produced for one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisPayload {
    pub summary: String,
    pub keywords: Vec<String>,
    pub class: AnalysisClass,
    pub signals: Signals,
    pub actions: Vec<String>,
    pub risks: Vec<String>,
    pub quotes: Vec<String>,
}

impl AnalysisPayload {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        oa_schema::parse(value, &ANALYSIS_PAYLOAD_SHAPE)
    }
}

/// The result file written once per block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisResult {
    pub block_id: String,
    pub model: String,
    #[serde(deserialize_with = "serde_utc::deserialize")]
    pub completed_at: Timestamp,
    pub analysis_version: String,
    pub analysis: AnalysisPayload,
}

impl AnalysisResult {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        oa_schema::parse(value, &ANALYSIS_RESULT_SHAPE)
    }
}

/// Category of an analysis failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    Network,
    RateLimit,
    #[serde(rename = "InvalidJSON")]
    InvalidJson,
    #[serde(rename = "IOError")]
    IoError,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::RateLimit => "RateLimit",
            Self::InvalidJson => "InvalidJSON",
            Self::IoError => "IOError",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Network" => Ok(Self::Network),
            "RateLimit" => Ok(Self::RateLimit),
            "InvalidJSON" => Ok(Self::InvalidJson),
            "IOError" => Ok(Self::IoError),
            other => Err(TypeError::UnknownErrorType(other.to_string())),
        }
    }
}

/// The error file written for a failed analysis attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisErrorRecord {
    pub block_id: String,
    pub task_id: String,
    pub error_type: ErrorType,
    pub error_detail: String,
    pub response_text: Option<String>,
    #[serde(deserialize_with = "serde_utc::deserialize")]
    pub timestamp: Timestamp,
}

impl AnalysisErrorRecord {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        oa_schema::parse(value, &ANALYSIS_ERROR_SHAPE)
    }
}

#[cfg(test)]
mod tests {
    use oa_schema::ViolationReason;
    use serde_json::json;

    use super::*;

    fn payload() -> Value {
        json!({
            "summary": "Quarterly planning notes",
            "keywords": ["budget", "hiring"],
            "class": "useful",
            "signals": {"people": ["Ana"], "projects": ["Atlas"], "dates": ["1998-04-02"]},
            "actions": [],
            "risks": ["overspend"],
            "quotes": []
        })
    }

    #[test]
    fn payload_parses() {
        let p = AnalysisPayload::from_value(payload()).unwrap();
        assert_eq!(p.class, AnalysisClass::Useful);
        assert_eq!(p.signals.projects, vec!["Atlas"]);
    }

    #[test]
    fn too_many_keywords() {
        let mut v = payload();
        v["keywords"] = json!((0..13).map(|i| format!("k{i}")).collect::<Vec<_>>());
        let err = AnalysisPayload::from_value(v).unwrap_err();
        match err {
            SchemaError::Violation(v) => {
                assert_eq!(v.field, "keywords");
                assert_eq!(v.reason, ViolationReason::TooManyItems { max: 12, actual: 13 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_signals_are_closed() {
        let mut v = payload();
        v["signals"]["places"] = json!([]);
        assert!(AnalysisPayload::from_value(v).is_err());
    }

    #[test]
    fn result_wraps_payload() {
        let v = json!({
            "block_id": "doc-0001",
            "model": "m-1",
            "completed_at": "2024-01-01T00:00:00Z",
            "analysis_version": "1.0",
            "analysis": payload()
        });
        let r = AnalysisResult::from_value(v).unwrap();
        assert_eq!(r.analysis.keywords.len(), 2);
    }

    #[test]
    fn error_record_uses_wire_names() {
        let v = json!({
            "block_id": "doc-0001",
            "task_id": "t-1",
            "error_type": "InvalidJSON",
            "error_detail": "unterminated string",
            "response_text": null,
            "timestamp": "2024-01-01T00:00:00Z"
        });
        let rec = AnalysisErrorRecord::from_value(v).unwrap();
        assert_eq!(rec.error_type, ErrorType::InvalidJson);
        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(out["error_type"], "InvalidJSON");
        assert_eq!("IOError".parse::<ErrorType>().unwrap(), ErrorType::IoError);
    }
}
