use std::path::{Path, PathBuf};

use oa_types::{format_timestamp, AnalysisResult, Timestamp, ANALYSIS_PAYLOAD_SHAPE};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{ArchiveError, Result};
use crate::files::{check_block_id, ensure_dir, write_new};

const RESULTS_DIR: &str = "AnalysisResults";

/// Writes one result file per block under `<root>/Archive/AnalysisResults`.
///
/// Result files are write-once. Writing a block that already has a result
/// leaves the existing file alone and returns its path.
#[derive(Clone, Debug)]
pub struct ResultWriter {
    root: PathBuf,
}

impl ResultWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the result for `block_id` is (or would be) stored.
    pub fn path_for(&self, block_id: &str) -> PathBuf {
        self.root
            .join("Archive")
            .join(RESULTS_DIR)
            .join(format!("{block_id}.json"))
    }

    /// Validate `analysis`, wrap it with its metadata and store it.
    ///
    /// The payload is checked against the analysis payload contract before
    /// anything touches disk, then the complete record against the result
    /// contract.
    pub fn write_result(
        &self,
        block_id: &str,
        model: &str,
        analysis_version: &str,
        analysis: Value,
        completed_at: Timestamp,
    ) -> Result<PathBuf> {
        check_block_id(block_id)?;
        oa_schema::validate(&analysis, &ANALYSIS_PAYLOAD_SHAPE)?;

        let record = AnalysisResult::from_value(json!({
            "block_id": block_id,
            "model": model,
            "completed_at": format_timestamp(&completed_at),
            "analysis_version": analysis_version,
            "analysis": analysis,
        }))?;
        let bytes = serde_json::to_vec(&record).map_err(|e| ArchiveError::Serialization(e.to_string()))?;

        let dir = ensure_dir(&self.root, RESULTS_DIR)?;
        let path = dir.join(format!("{block_id}.json"));
        if write_new(&path, &bytes)? {
            info!(block_id, path = %path.display(), "result written");
        } else {
            info!(block_id, path = %path.display(), "result file already exists; skipping write");
        }
        Ok(path)
    }
}
