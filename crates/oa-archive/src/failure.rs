use std::io;
use std::path::{Path, PathBuf};

use oa_types::{format_timestamp, AnalysisErrorRecord, ErrorType, Timestamp, ANALYSIS_ERROR_SHAPE};
use tracing::info;

use crate::error::{ArchiveError, Result};
use crate::files::{check_block_id, ensure_dir, io_error, write_new};

const ERRORS_DIR: &str = "AnalysisErrors";
const MAX_COLLISIONS: u32 = 9_999;

/// Writes error records under `<root>/Archive/AnalysisErrors`.
///
/// The first failure of a block goes to `<block_id>.json`. Later failures
/// get `<block_id>__<timestamp>.json`, with the timestamp stripped of `-`
/// and `:`, and a counter if even that name is taken. Nothing is ever
/// overwritten.
#[derive(Clone, Debug)]
pub struct ErrorWriter {
    root: PathBuf,
}

impl ErrorWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_error(
        &self,
        block_id: &str,
        task_id: &str,
        error_type: ErrorType,
        error_detail: &str,
        response_text: Option<&str>,
        timestamp: Timestamp,
    ) -> Result<PathBuf> {
        check_block_id(block_id)?;
        let record = AnalysisErrorRecord {
            block_id: block_id.to_string(),
            task_id: task_id.to_string(),
            error_type,
            error_detail: error_detail.to_string(),
            response_text: response_text.map(str::to_string),
            timestamp,
        };
        let value = serde_json::to_value(&record).map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        oa_schema::validate(&value, &ANALYSIS_ERROR_SHAPE)?;
        let bytes = serde_json::to_vec(&value).map_err(|e| ArchiveError::Serialization(e.to_string()))?;

        let dir = ensure_dir(&self.root, ERRORS_DIR)?;
        let suffix = compact_timestamp(&timestamp);
        for attempt in 0..=MAX_COLLISIONS + 1 {
            let name = match attempt {
                0 => format!("{block_id}.json"),
                1 => format!("{block_id}__{suffix}.json"),
                n => format!("{block_id}__{suffix}_{}.json", n - 1),
            };
            let path = dir.join(name);
            if write_new(&path, &bytes)? {
                info!(block_id, task_id, %error_type, path = %path.display(), "error written");
                return Ok(path);
            }
        }
        Err(io_error(
            &dir,
            io::Error::new(io::ErrorKind::AlreadyExists, format!("no free error file name for {block_id}")),
        ))
    }
}

/// `2024-06-01T09:30:00Z` becomes `20240601T093000Z`.
fn compact_timestamp(ts: &Timestamp) -> String {
    format_timestamp(ts).replace(['-', ':'], "")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use oa_types::parse_timestamp;
    use serde_json::Value;

    use super::*;

    fn at(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn read(path: &Path) -> AnalysisErrorRecord {
        let value: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        AnalysisErrorRecord::from_value(value).unwrap()
    }

    #[test]
    fn first_error_uses_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = ErrorWriter::new(dir.path())
            .write_error(
                "doc-0003",
                "t-3",
                ErrorType::RateLimit,
                "429 from upstream",
                None,
                at("2024-06-01T09:30:00Z"),
            )
            .unwrap();

        assert_eq!(path, dir.path().join("Archive/AnalysisErrors/doc-0003.json"));
        let record = read(&path);
        assert_eq!(record.error_type, ErrorType::RateLimit);
        assert!(record.response_text.is_none());
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""error_type":"RateLimit""#));
        assert!(raw.contains(r#""response_text":null"#));
    }

    #[test]
    fn later_errors_keep_history() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ErrorWriter::new(dir.path());
        let ts = at("2024-06-01T09:30:00Z");

        let first = writer
            .write_error("doc-0003", "t-3", ErrorType::Network, "reset", None, ts)
            .unwrap();
        let second = writer
            .write_error("doc-0003", "t-3", ErrorType::InvalidJson, "bad body", Some("{oops"), ts)
            .unwrap();
        let third = writer
            .write_error("doc-0003", "t-3", ErrorType::IoError, "disk full", None, ts)
            .unwrap();

        let names: Vec<_> = [&first, &second, &third]
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "doc-0003.json",
                "doc-0003__20240601T093000Z.json",
                "doc-0003__20240601T093000Z_1.json"
            ]
        );
        assert_eq!(read(&first).error_type, ErrorType::Network);
        assert_eq!(read(&second).response_text.as_deref(), Some("{oops"));
        assert_eq!(read(&third).error_type, ErrorType::IoError);
    }

    #[test]
    fn compact_timestamp_strips_separators() {
        assert_eq!(compact_timestamp(&at("2023-12-31T23:59:58Z")), "20231231T235958Z");
    }
}
