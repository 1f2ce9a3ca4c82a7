use std::path::{Path, PathBuf};

use oa_types::{QueueEntry, Timestamp};

use crate::error::Result;
use crate::machine::{self, Outcome};
use crate::store;

/// The in-memory working copy of a queue log.
///
/// Loaded as a whole, mutated through the state machine, and flushed back
/// as a whole with [`TaskQueue::save`]. The log on disk stays the source of
/// truth; nothing is written until `save` is called.
#[derive(Clone, Debug)]
pub struct TaskQueue {
    path: PathBuf,
    entries: Vec<QueueEntry>,
}

impl TaskQueue {
    /// Load the queue stored at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            entries: store::load_queue(path)?,
            path: path.to_path_buf(),
        })
    }

    /// A queue bound to `path` holding `entries`, without touching disk.
    pub fn with_entries(path: impl Into<PathBuf>, entries: Vec<QueueEntry>) -> Self {
        Self {
            path: path.into(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending entries in dispatch order.
    pub fn pending(&self) -> Vec<&QueueEntry> {
        store::filter_pending(&self.entries)
    }

    pub fn mark_in_progress(&mut self, id: &str) -> Result<Outcome> {
        machine::mark_in_progress(&mut self.entries, id)
    }

    pub fn mark_done(&mut self, id: &str, result_path: &str, completed_at: Timestamp) -> Result<Outcome> {
        machine::mark_done(&mut self.entries, id, result_path, completed_at)
    }

    pub fn mark_error(
        &mut self,
        id: &str,
        error_msg: &str,
        error_path: &str,
        completed_at: Timestamp,
    ) -> Result<Outcome> {
        machine::mark_error(&mut self.entries, id, error_msg, error_path, completed_at)
    }

    /// Atomically write the working copy back to its log.
    pub fn save(&self) -> Result<()> {
        store::save_queue(&self.path, &self.entries)
    }
}

#[cfg(test)]
mod tests {
    use oa_types::{parse_timestamp, TaskStatus};

    use super::*;

    #[test]
    fn load_mutate_save_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        let created = parse_timestamp("2024-02-01T08:00:00Z").unwrap();
        let entries = vec![
            QueueEntry::pending("t-1", "b-1", "Blocks/b-1.json", "de", "default", 2, created),
            QueueEntry::pending("t-2", "b-2", "Blocks/b-2.json", "de", "default", 4, created),
        ];
        TaskQueue::with_entries(&path, entries).save().unwrap();

        let mut queue = TaskQueue::open(&path).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pending()[0].id, "t-2");

        queue.mark_in_progress("t-2").unwrap();
        let done_at = parse_timestamp("2024-02-01T08:05:00Z").unwrap();
        queue.mark_done("t-2", "Results/b-2.json", done_at).unwrap();
        queue.save().unwrap();

        let reloaded = TaskQueue::open(&path).unwrap();
        let t2 = reloaded.get("t-2").unwrap();
        assert_eq!(t2.status, TaskStatus::Done);
        assert_eq!(t2.completed_at, Some(done_at));
        assert_eq!(reloaded.pending().len(), 1);
    }

    #[test]
    fn unsaved_changes_stay_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        let created = parse_timestamp("2024-02-01T08:00:00Z").unwrap();
        let entries = vec![QueueEntry::pending("t-1", "b-1", "Blocks/b-1.json", "de", "default", 0, created)];
        TaskQueue::with_entries(&path, entries).save().unwrap();

        let mut queue = TaskQueue::open(&path).unwrap();
        queue.mark_in_progress("t-1").unwrap();

        let on_disk = TaskQueue::open(&path).unwrap();
        assert_eq!(on_disk.get("t-1").unwrap().status, TaskStatus::Pending);
    }
}
