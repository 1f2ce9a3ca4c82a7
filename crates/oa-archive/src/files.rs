use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ArchiveError, Result};

pub(crate) fn io_error(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `<root>/Archive/<name>`, created if missing.
pub(crate) fn ensure_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let dir = root.join("Archive").join(name);
    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;
    Ok(dir)
}

/// Block ids become file names, so they must be a single path component.
pub(crate) fn check_block_id(block_id: &str) -> Result<()> {
    let bad = block_id.is_empty()
        || block_id == "."
        || block_id == ".."
        || block_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(ArchiveError::InvalidBlockId(block_id.to_string()));
    }
    Ok(())
}

/// Write `bytes` to `path` only if nothing exists there yet.
///
/// Returns `Ok(false)` if the file already existed. A failed write removes
/// the partial file.
pub(crate) fn write_new(path: &Path, bytes: &[u8]) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_error(path, e)),
    };

    if let Err(e) = file.write_all(bytes).and_then(|()| file.sync_all()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!(path = %path.display(), "could not remove partial file: {cleanup}");
        }
        return Err(io_error(path, e));
    }
    Ok(true)
}
