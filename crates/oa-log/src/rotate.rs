//! Size-rotated log file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use crate::error::{LogError, Result};

struct State {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_backups: usize,
}

impl State {
    fn rotate(&mut self) -> io::Result<()> {
        if self.max_backups > 0 {
            let oldest = backup_path(&self.path, self.max_backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.max_backups).rev() {
                let from = backup_path(&self.path, n);
                if from.exists() {
                    fs::rename(&from, backup_path(&self.path, n + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

/// A log file that rolls over to numbered backups once it reaches a size.
///
/// Before a record is written, if the file is non-empty and the record
/// would take it to `max_bytes` or beyond, the file is rotated:
/// `log.N` is dropped, `log.i` becomes `log.i+1`, and `log` becomes
/// `log.1`. Cloning shares the same file.
#[derive(Clone)]
pub struct RotatingFile {
    state: Arc<Mutex<State>>,
}

impl RotatingFile {
    /// Open (or create) `path` for appending, creating parent directories.
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, max_backups: usize) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| LogError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        let written = file.metadata().map_err(io_err)?.len();

        Ok(Self {
            state: Arc::new(Mutex::new(State {
                path: path.to_path_buf(),
                file,
                written,
                max_bytes,
                max_backups,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `<path>.<n>`
pub fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Exclusive handle on the file for one record.
pub struct RotatingWriter<'a> {
    state: MutexGuard<'a, State>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let state = &mut *self.state;
        if state.max_bytes > 0 && state.written > 0 && state.written + buf.len() as u64 >= state.max_bytes {
            state.rotate()?;
        }
        let n = state.file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriter { state: self.lock() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file: &RotatingFile, line: &str) {
        let mut w = file.make_writer();
        w.write_all(line.as_bytes()).unwrap();
    }

    #[test]
    fn appends_below_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Logs").join("operator.log");
        let file = RotatingFile::open(&path, 1024, 3).unwrap();
        record(&file, "one\n");
        record(&file, "two\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn reopening_continues_size_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.log");
        record(&RotatingFile::open(&path, 20, 1).unwrap(), "0123456789\n");

        let file = RotatingFile::open(&path, 20, 1).unwrap();
        record(&file, "abcdefghij\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefghij\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "0123456789\n");
    }

    #[test]
    fn keeps_at_most_max_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.log");
        let file = RotatingFile::open(&path, 10, 2).unwrap();
        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            record(&file, line);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddddddd\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "cccccccc\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "bbbbbbbb\n");
        assert!(!backup_path(&path, 3).exists());
    }

    #[test]
    fn zero_backups_truncates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.log");
        let file = RotatingFile::open(&path, 10, 0).unwrap();
        record(&file, "aaaaaaaa\n");
        record(&file, "bbbbbbbb\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbbbbbb\n");
        assert!(!backup_path(&path, 1).exists());
    }
}
