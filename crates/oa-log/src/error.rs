use std::io;
use std::path::PathBuf;

/// Errors produced while setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file or its directory could not be opened or created.
    #[error("cannot open log file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A level name outside DEBUG/INFO/WARNING/ERROR.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber was already installed.
    #[error("logging already initialised: {0}")]
    AlreadyInstalled(String),
}

pub type Result<T> = std::result::Result<T, LogError>;
