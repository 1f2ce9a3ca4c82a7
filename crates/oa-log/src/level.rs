use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

use crate::error::LogError;

/// The four levels the operator log knows about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    #[serde(alias = "WARN")]
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }

    /// Parse an override value, falling back to INFO for anything unknown.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

/// The label written between brackets for a `tracing` level.
pub fn label(level: &Level) -> &'static str {
    match *level {
        Level::TRACE | Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!(" Warning ".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn unknown_override_falls_back_to_info() {
        assert_eq!(LogLevel::parse_or_default("loud"), LogLevel::Info);
        assert_eq!(LogLevel::parse_or_default("error"), LogLevel::Error);
    }

    #[test]
    fn labels_fold_trace_and_spell_out_warning() {
        assert_eq!(label(&Level::TRACE), "DEBUG");
        assert_eq!(label(&Level::WARN), "WARNING");
        assert_eq!(LogLevel::Warning.filter(), LevelFilter::WARN);
    }
}
