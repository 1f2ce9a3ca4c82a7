use std::io;

/// Errors produced by the task queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// I/O error while reading or persisting the queue log.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// No entry with the given id exists in the queue.
    #[error("task not found: {id}")]
    NotFound { id: String },

    /// An entry could not be serialized to its line form.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the queue crate.
pub type Result<T> = std::result::Result<T, QueueError>;
