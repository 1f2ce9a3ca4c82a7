//! The operator log.
//!
//! Every crate in the workspace logs through `tracing`. This crate owns
//! the one sink those events end up in: a UTC line format
//! ([`LineFormat`]) written to a size-rotated file ([`RotatingFile`]),
//! filtered at the level from [`LogConfig`] (overridable through
//! `OPERATOR_LOG_LEVEL`).
//!
//! The binary builds the subscriber once at startup with [`install`].
//! Tests scope one with [`build_subscriber`] and
//! `tracing::subscriber::with_default`.

pub mod config;
pub mod error;
pub mod format;
pub mod level;
pub mod rotate;

pub use config::{LogConfig, LEVEL_ENV};
pub use error::{LogError, Result};
pub use format::LineFormat;
pub use level::LogLevel;
pub use rotate::{backup_path, RotatingFile};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::DefaultFields;

/// The subscriber type produced by [`build_subscriber`].
pub type OperatorSubscriber = tracing_subscriber::fmt::Subscriber<DefaultFields, LineFormat, LevelFilter, RotatingFile>;

/// Build a subscriber writing to the file described by `config`.
pub fn build_subscriber(config: &LogConfig) -> Result<OperatorSubscriber> {
    build_with_format(config, LineFormat::default())
}

/// Like [`build_subscriber`] with an explicit formatter.
pub fn build_with_format(config: &LogConfig, format: LineFormat) -> Result<OperatorSubscriber> {
    let file = RotatingFile::open(&config.path, config.max_bytes, config.max_backups)?;
    Ok(tracing_subscriber::fmt()
        .with_max_level(config.level.filter())
        .with_ansi(false)
        .event_format(format)
        .with_writer(file)
        .finish())
}

/// Build the subscriber for `config` and make it the global default.
///
/// Fails if a global subscriber is already set.
pub fn install(config: &LogConfig) -> Result<()> {
    let subscriber = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber).map_err(|e| LogError::AlreadyInstalled(e.to_string()))?;
    tracing::debug!(path = %config.path.display(), level = %config.level, "logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{DateTime, TimeZone, Utc};
    use tracing::{debug, error, info, trace, warn};

    use super::*;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 6, 5, 4).unwrap()
    }

    fn config(dir: &std::path::Path, level: LogLevel) -> LogConfig {
        LogConfig {
            path: dir.join("Logs").join("operator.log"),
            level,
            ..LogConfig::default()
        }
    }

    #[test]
    fn writes_operator_line_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), LogLevel::Info);
        let subscriber = build_with_format(&config, LineFormat::with_clock(fixed)).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            info!("Queue saved");
            warn!(block_id = "doc-1", "hash mismatch");
            error!("disk full");
        });

        let text = fs::read_to_string(&config.path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "2024-07-01T06:05:04Z [INFO] Queue saved",
                "2024-07-01T06:05:04Z [WARNING] hash mismatch block_id=\"doc-1\"",
                "2024-07-01T06:05:04Z [ERROR] disk full",
            ]
        );
    }

    #[test]
    fn level_filters_lower_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), LogLevel::Warning);
        let subscriber = build_subscriber(&config).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            debug!("hidden");
            info!("hidden too");
            warn!("shown");
        });

        let text = fs::read_to_string(&config.path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("[WARNING] shown"));
    }

    #[test]
    fn debug_level_still_drops_trace() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), LogLevel::Debug);
        let subscriber = build_with_format(&config, LineFormat::with_clock(fixed)).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            trace!("noise");
            debug!("detail");
        });

        let text = fs::read_to_string(&config.path).unwrap();
        assert_eq!(text, "2024-07-01T06:05:04Z [DEBUG] detail\n");
    }
}
