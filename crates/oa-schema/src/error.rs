//! Error types for record validation.

use std::fmt;

use thiserror::Error;

/// Why a single field failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViolationReason {
    /// A required field is absent.
    Missing,
    /// The field is present but does not have the expected semantic type.
    WrongType { expected: String },
    /// The field is not part of the closed field set.
    Unexpected,
    /// The record (or a nested record) is not a JSON object.
    NotAnObject,
    /// A list field holds more items than allowed.
    TooManyItems { max: usize, actual: usize },
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "required field is missing"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::Unexpected => write!(f, "unexpected field"),
            Self::NotAnObject => write!(f, "expected a JSON object"),
            Self::TooManyItems { max, actual } => {
                write!(f, "at most {max} items allowed, got {actual}")
            }
        }
    }
}

/// A breach of a record's structural contract.
///
/// `field` is a dotted path from the record root (`"analysis.signals.people"`);
/// it is empty when the record itself is not an object.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("schema violation in {shape}: {field}: {reason}")]
pub struct SchemaViolation {
    /// Name of the shape being validated (e.g. `"block"`).
    pub shape: &'static str,
    /// Path of the offending field.
    pub field: String,
    /// What was wrong with it.
    pub reason: ViolationReason,
}

impl SchemaViolation {
    pub(crate) fn new(shape: &'static str, field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            shape,
            field: field.into(),
            reason,
        }
    }
}

/// Errors from [`crate::parse`]: either the structure is wrong or the
/// validated value still could not be converted into the target type.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Violation(#[from] SchemaViolation),

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Convenience alias for validation results.
pub type Result<T> = std::result::Result<T, SchemaViolation>;
