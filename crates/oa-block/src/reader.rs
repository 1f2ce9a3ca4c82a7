//! Reading block files from storage.

use std::fs;
use std::path::Path;

use oa_schema::SchemaError;
use oa_types::Block;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{BlockError, Result};
use crate::finding::{IntegrityReport, Policy};
use crate::integrity::check_integrity;

/// A block that passed structural validation, with its integrity report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBlock {
    pub block: Block,
    pub report: IntegrityReport,
}

/// Reads block files and runs the full validation pipeline on them.
///
/// By default the policy follows the block's own `status`: `ok` blocks are
/// checked strictly, damaged and binary blocks leniently. An explicit
/// policy overrides that choice for every block read.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockReader {
    policy: Option<Policy>,
}

impl BlockReader {
    /// A reader that picks the policy from each block's status.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader that always applies `policy`.
    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy: Some(policy),
        }
    }

    /// Read, parse, and validate the block stored at `path`.
    pub fn read(&self, path: &Path) -> Result<ValidatedBlock> {
        let bytes = fs::read(path).map_err(|source| BlockError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| BlockError::MalformedJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !value.is_object() {
            return Err(BlockError::MalformedJson {
                path: path.to_path_buf(),
                reason: format!("block must be a JSON object, got {}", json_kind(&value)),
            });
        }

        let block = Block::from_value(value).map_err(|e| match e {
            SchemaError::Violation(v) => BlockError::Schema(v),
            SchemaError::Deserialize(e) => BlockError::MalformedJson {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let policy = self.policy.unwrap_or_else(|| Policy::for_status(block.status));
        debug!(block_id = %block.block_id, path = %path.display(), ?policy, "validating block");
        let report = check_integrity(&block, policy)?;
        if report.is_clean() {
            info!(block_id = %block.block_id, "block validated");
        } else {
            info!(
                block_id = %block.block_id,
                findings = report.findings.len(),
                "block validated with findings"
            );
        }

        Ok(ValidatedBlock { block, report })
    }
}

/// Read and validate a block with the status-derived policy.
pub fn read_block(path: impl AsRef<Path>) -> Result<ValidatedBlock> {
    BlockReader::new().read(path.as_ref())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
