use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use oa_log::LogConfig;
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "operator.toml";

/// Settings for the `oa` binary, read from TOML.
///
/// Relative paths are resolved against `archive_root`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub archive_root: PathBuf,
    pub queue_path: PathBuf,
    /// Model name recorded in results when none is given.
    pub model: String,
    pub analysis_version: String,
    pub log: LogConfig,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            archive_root: PathBuf::from("."),
            queue_path: PathBuf::from("Archive/queue.jsonl"),
            model: "unknown".into(),
            analysis_version: "1".into(),
            log: LogConfig::default(),
        }
    }
}

impl OperatorConfig {
    /// Read `path`, or `operator.toml` if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("cannot read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.archive_root.join(path)
        }
    }

    pub fn queue_file(&self) -> PathBuf {
        self.resolve(&self.queue_path)
    }

    /// The log settings with the file path resolved.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            path: self.resolve(&self.log.path),
            ..self.log.clone()
        }
    }
}
