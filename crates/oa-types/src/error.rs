use thiserror::Error;

/// Errors produced when parsing type values from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown task status: {0}")]
    UnknownTaskStatus(String),

    #[error("unknown block status: {0}")]
    UnknownBlockStatus(String),

    #[error("unknown error type: {0}")]
    UnknownErrorType(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
