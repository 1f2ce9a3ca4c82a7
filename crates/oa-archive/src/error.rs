use std::io;
use std::path::PathBuf;

use oa_schema::{SchemaError, SchemaViolation};

/// Errors produced while writing archive records.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Filesystem failure, with the file or directory involved.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The record does not satisfy its field contract.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// The record passed its shape but could not be converted or encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The block id cannot be used as a file name.
    #[error("invalid block id for a file name: {0:?}")]
    InvalidBlockId(String),
}

impl From<SchemaError> for ArchiveError {
    fn from(e: SchemaError) -> Self {
        match e {
            SchemaError::Violation(v) => Self::Schema(v),
            SchemaError::Deserialize(e) => Self::Serialization(e.to_string()),
        }
    }
}

/// Convenience alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
