//! Error types for block reading and validation.

use std::io;
use std::path::PathBuf;

use oa_schema::SchemaViolation;

use crate::finding::Finding;

/// Errors that can occur while reading or validating a block.
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    /// The block file could not be read.
    #[error("cannot read block {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not a parsable JSON object.
    #[error("malformed block JSON in {}: {reason}", path.display())]
    MalformedJson { path: PathBuf, reason: String },

    /// The record breaks the block field contract.
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    /// Strict validation found one or more hard integrity violations.
    #[error("block {block_id} failed integrity validation: {}", list_findings(findings))]
    Validation {
        block_id: String,
        findings: Vec<Finding>,
    },

    /// The declared encoding cannot encode the text (strict mode only).
    #[error("block {block_id}: cannot encode text as {encoding:?}: {reason}")]
    Encoding {
        block_id: String,
        encoding: String,
        reason: String,
    },
}

fn list_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("{}: {}", f.code, f.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for block operations.
pub type Result<T> = std::result::Result<T, BlockError>;
