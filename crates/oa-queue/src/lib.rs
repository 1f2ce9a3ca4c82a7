//! Durable task queue for the operator archive.
//!
//! The queue lives in a JSON Lines log, one [`QueueEntry`] per line. A
//! single writer loads it, drives entries through the task state machine,
//! and saves it back atomically. No inter-process locking is done: two
//! writers racing on the same log can lose updates.
//!
//! # Key Types
//!
//! - [`TaskQueue`]: load/mutate/save working copy
//! - [`load_queue`], [`filter_pending`], [`save_queue`]: store operations
//! - [`step`] / [`Step`] / [`TaskEvent`]: the transition table
//! - [`Outcome`]: whether a mutation changed anything
//! - [`StagedLog`]: a written but uncommitted log replacement

pub mod error;
pub mod machine;
pub mod persist;
pub mod queue;
pub mod store;

pub use error::{QueueError, Result};
pub use machine::{mark_done, mark_error, mark_in_progress, step, Outcome, Step, TaskEvent};
pub use oa_types::{QueueEntry, TaskStatus};
pub use persist::{save_atomic, stage, StagedLog};
pub use queue::TaskQueue;
pub use store::{filter_pending, load_queue, save_queue};
