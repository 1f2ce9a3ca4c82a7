//! Loading, ordering and saving the line-oriented queue log.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use oa_types::{QueueEntry, TaskStatus};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::persist;

/// Read every valid entry from the queue log at `path`.
///
/// Each non-blank line is parsed and schema-checked on its own. Lines that
/// fail, and lines repeating an id already seen, are logged and skipped.
/// Only a failure to read the file itself is returned as an error.
pub fn load_queue(path: impl AsRef<Path>) -> Result<Vec<QueueEntry>> {
    let path = path.as_ref();
    let bytes = fs::read(path).inspect_err(|e| {
        error!(path = %path.display(), "cannot read queue file: {e}");
    })?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut processed = 0usize;

    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = idx + 1;
        if raw.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        processed += 1;

        let value: Value = match serde_json::from_slice(raw) {
            Ok(v) => v,
            Err(e) => {
                error!(line, "failed to parse JSON at line {line}: {e}");
                continue;
            }
        };
        let entry = match QueueEntry::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                error!(line, "invalid queue entry at line {line}: {e}");
                continue;
            }
        };
        if !seen.insert(entry.id.clone()) {
            error!(line, task_id = %entry.id, "duplicate task id at line {line}; keeping the first occurrence");
            continue;
        }
        if let Some(issue) = entry.lifecycle_issue() {
            warn!(line, task_id = %entry.id, "inconsistent queue entry: {issue}");
        }
        entries.push(entry);
    }

    let skipped = processed - entries.len();
    if skipped > 0 {
        info!(
            "Loaded {} task(s) from queue file {}, skipped {skipped} invalid line(s)",
            entries.len(),
            path.display()
        );
    } else {
        info!("Loaded {} task(s) from queue file {}", entries.len(), path.display());
    }
    Ok(entries)
}

/// Pending entries in dispatch order.
///
/// Highest priority first; equal priorities run oldest first. The sort is
/// stable, so entries equal on both keys keep their log order.
pub fn filter_pending(entries: &[QueueEntry]) -> Vec<&QueueEntry> {
    let mut pending: Vec<&QueueEntry> = entries
        .iter()
        .filter(|e| e.status == TaskStatus::Pending)
        .collect();
    pending.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    pending
}

/// Atomically replace the queue log at `path` with `entries`.
pub fn save_queue(path: impl AsRef<Path>, entries: &[QueueEntry]) -> Result<()> {
    persist::save_atomic(path.as_ref(), entries)
}
