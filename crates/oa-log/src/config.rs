use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::level::LogLevel;

/// Environment variable that overrides the configured level.
pub const LEVEL_ENV: &str = "OPERATOR_LOG_LEVEL";

/// Where and how the operator log is written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Active log file; backups sit beside it as `<path>.1` … `<path>.N`.
    pub path: PathBuf,
    pub level: LogLevel,
    /// Size at which the active file is rotated (default: 5 MiB).
    pub max_bytes: u64,
    /// Number of rotated files kept.
    pub max_backups: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Archive/Logs/operator.log"),
            level: LogLevel::Info,
            max_bytes: 5 * 1024 * 1024,
            max_backups: 5,
        }
    }
}

impl LogConfig {
    /// Apply [`LEVEL_ENV`] if it is set.
    pub fn apply_env(&mut self) {
        self.apply_level_override(env::var(LEVEL_ENV).ok().as_deref());
    }

    /// Replace the level with `raw` if given; unknown names mean INFO.
    pub fn apply_level_override(&mut self, raw: Option<&str>) {
        if let Some(raw) = raw {
            self.level = LogLevel::parse_or_default(raw);
        }
    }
}
