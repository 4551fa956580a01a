//! Single-instance run lock.
//!
//! An exclusive advisory lock on a well-known file. The OS drops the lock when
//! the process dies, so a crash never leaves a stale lock behind; a leftover
//! file without a holder is simply locked again by the next run.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// How often acquisition is retried when the lock file is swapped under us.
const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Failed to lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock file {path} kept changing while acquiring it")]
    Unstable { path: PathBuf },
}

/// Guard for the run lock. Dropping it unlinks the file and releases the lock.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    file: File,
}

impl RunLock {
    /// Tries to take the lock without blocking.
    ///
    /// Returns `Ok(None)` when another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<RunLock>, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        for attempt in 1..=MAX_ATTEMPTS {
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(io_err)?;

            match file.try_lock() {
                Ok(()) => {}
                Err(TryLockError::WouldBlock) => return Ok(None),
                Err(TryLockError::Error(e)) => return Err(io_err(e)),
            }

            // A holder releasing concurrently may have unlinked the path after
            // we opened it; then we locked an orphaned inode.
            if !still_named_by(&file, path) {
                debug!(path = %path.display(), attempt, "Lock file replaced, retrying");
                continue;
            }

            file.set_len(0).map_err(io_err)?;
            write!(file, "{}", std::process::id()).map_err(io_err)?;

            return Ok(Some(RunLock {
                path: path.to_path_buf(),
                file,
            }));
        }

        Err(LockError::Unstable {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Unlink while still holding the lock, then release.
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove lock file");
        }
        if let Err(e) = self.file.unlock() {
            debug!(path = %self.path.display(), error = %e, "Failed to unlock lock file");
        }
    }
}

#[cfg(unix)]
fn still_named_by(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), std::fs::metadata(path)) {
        (Ok(held), Ok(named)) => held.dev() == named.dev() && held.ino() == named.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_named_by(_file: &File, path: &Path) -> bool {
    path.exists()
}
