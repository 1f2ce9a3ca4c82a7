//! Crash-safe replacement of the queue log.
//!
//! Saving is split in two phases so the window between them is observable:
//!
//! 1. [`stage`] serializes every entry into a temporary file next to the
//!    target, flushes it and forces it to disk.
//! 2. [`StagedLog::commit`] renames the temporary file over the target and
//!    syncs the directory.
//!
//! Until the rename the target keeps its old bytes. A [`StagedLog`] dropped
//! without committing deletes its temporary file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use oa_types::QueueEntry;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::error::{QueueError, Result};

/// A fully written, synced, but not yet visible queue log.
#[derive(Debug)]
pub struct StagedLog {
    file: NamedTempFile,
    target: PathBuf,
    entries: usize,
}

impl StagedLog {
    /// Where the staged content currently lives.
    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// The path the log will replace on commit.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace the target with the staged content.
    ///
    /// Once the rename succeeds the new log is in place, so a failed
    /// directory sync afterwards is logged and not returned.
    pub fn commit(self) -> Result<()> {
        self.commit_with(sync_dir)
    }

    fn commit_with(self, sync: fn(&Path) -> io::Result<()>) -> Result<()> {
        let Self {
            file,
            target,
            entries,
        } = self;

        file.persist(&target).map_err(|e| {
            error!(path = %target.display(), "failed to replace queue file: {}", e.error);
            QueueError::Io(e.error)
        })?;
        if let Err(e) = sync(parent_dir(&target)) {
            warn!(path = %target.display(), "queue replaced but directory sync failed: {e}");
        }

        info!(path = %target.display(), entries, "queue saved");
        Ok(())
    }
}

/// Write `entries` to a temporary file in the same directory as `path`.
///
/// Each entry becomes one compact JSON line. The parent directory is
/// created if needed.
pub fn stage(path: &Path, entries: &[QueueEntry]) -> Result<StagedLog> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(&mut file);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)
                .map_err(|e| QueueError::Serialization(e.to_string()))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    file.as_file().sync_all()?;

    debug!(
        path = %path.display(),
        temp = %file.path().display(),
        entries = entries.len(),
        "queue staged"
    );
    Ok(StagedLog {
        file,
        target: path.to_path_buf(),
        entries: entries.len(),
    })
}

/// Stage and commit in one call.
pub fn save_atomic(path: &Path, entries: &[QueueEntry]) -> Result<()> {
    let staged = stage(path, entries).inspect_err(|e| {
        error!(path = %path.display(), "failed to write queue to temp file: {e}");
    })?;
    staged.commit()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
