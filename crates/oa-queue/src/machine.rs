//! The task lifecycle as a transition table.
//!
//! ```text
//! pending ──start──▶ in_progress
//!    │                   │
//!    ├──complete─────────┼──▶ done   (terminal)
//!    └──fail─────────────┴──▶ error  (terminal)
//! ```
//!
//! Every other pair of state and event is a no-op. The mutation functions
//! never fail for an illegal transition; they report
//! [`Outcome::Unchanged`] and log it. Only an unknown id is an error.

use oa_types::{QueueEntry, TaskStatus, Timestamp};
use tracing::{error, info, warn};

use crate::error::{QueueError, Result};

/// Something that can happen to a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskEvent {
    Start,
    Complete,
    Fail,
}

impl TaskEvent {
    fn target(&self) -> TaskStatus {
        match self {
            Self::Start => TaskStatus::InProgress,
            Self::Complete => TaskStatus::Done,
            Self::Fail => TaskStatus::Error,
        }
    }
}

/// Result of looking up a `(state, event)` pair in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Move to the given state.
    Advance(TaskStatus),
    /// The entry is already where the event would take it.
    Repeat,
    /// The event is not allowed from this state.
    Blocked,
}

/// The transition table.
pub fn step(from: TaskStatus, event: TaskEvent) -> Step {
    use TaskEvent::*;
    use TaskStatus::*;

    match (from, event) {
        (Pending, Start) => Step::Advance(InProgress),
        (Pending | InProgress, Complete) => Step::Advance(Done),
        (Pending | InProgress, Fail) => Step::Advance(Error),
        (s, e) if s == e.target() => Step::Repeat,
        _ => Step::Blocked,
    }
}

/// What a mutation did to the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied { from: TaskStatus, to: TaskStatus },
    Unchanged { reason: String },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Move the task `id` from `pending` to `in_progress`.
pub fn mark_in_progress(entries: &mut [QueueEntry], id: &str) -> Result<Outcome> {
    let entry = find(entries, id, "mark_in_progress")?;
    Ok(apply(entry, TaskEvent::Start, |_| {}))
}

/// Finish the task `id` successfully.
///
/// Sets `completed_at` and `result_path` and clears any error fields.
pub fn mark_done(
    entries: &mut [QueueEntry],
    id: &str,
    result_path: &str,
    completed_at: Timestamp,
) -> Result<Outcome> {
    let entry = find(entries, id, "mark_done")?;
    Ok(apply(entry, TaskEvent::Complete, |e| {
        e.completed_at = Some(completed_at);
        e.result_path = Some(result_path.to_string());
        e.error_path = None;
        e.error_msg = None;
    }))
}

/// Finish the task `id` with a failure.
///
/// Sets `completed_at`, `error_msg` and `error_path` and clears
/// `result_path`.
pub fn mark_error(
    entries: &mut [QueueEntry],
    id: &str,
    error_msg: &str,
    error_path: &str,
    completed_at: Timestamp,
) -> Result<Outcome> {
    let entry = find(entries, id, "mark_error")?;
    Ok(apply(entry, TaskEvent::Fail, |e| {
        e.completed_at = Some(completed_at);
        e.error_msg = Some(error_msg.to_string());
        e.error_path = Some(error_path.to_string());
        e.result_path = None;
    }))
}

fn find<'a>(entries: &'a mut [QueueEntry], id: &str, op: &str) -> Result<&'a mut QueueEntry> {
    match entries.iter_mut().find(|e| e.id == id) {
        Some(entry) => Ok(entry),
        None => {
            error!(task_id = id, "{op}: task not found");
            Err(QueueError::NotFound { id: id.to_string() })
        }
    }
}

fn apply(entry: &mut QueueEntry, event: TaskEvent, update: impl FnOnce(&mut QueueEntry)) -> Outcome {
    let from = entry.status;
    match step(from, event) {
        Step::Advance(to) => {
            update(entry);
            entry.status = to;
            info!(task_id = %entry.id, %from, %to, "task marked as {to}");
            Outcome::Applied { from, to }
        }
        Step::Repeat => {
            info!(task_id = %entry.id, "task is already {from} (no change)");
            Outcome::Unchanged {
                reason: format!("already {from}"),
            }
        }
        Step::Blocked => {
            let target = event.target();
            warn!(task_id = %entry.id, "cannot mark task as {target} (already {from})");
            Outcome::Unchanged {
                reason: format!("cannot move from {from} to {target}"),
            }
        }
    }
}
