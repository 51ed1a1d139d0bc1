//! Advisory locking of `.kindred/lock` around tree reads and writes.
//!
//! Writers hold [`TreeLock`] (exclusive) across temp-file write and rename;
//! readers hold [`TreeReadLock`] (shared). Both poll with a deadline rather
//! than blocking forever, so a wedged process yields
//! [`LockError::Timeout`] instead of a hang.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::ErrorCode;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{}: could not lock {} within {waited:?}", ErrorCode::LockContention, .path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error("{}: cannot open lock file: {0}", ErrorCode::TreeWriteFailed)]
    IoError(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::TreeWriteFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Shared,
    Exclusive,
}

/// An open lock file with a held lock; unlocked on drop.
#[derive(Debug)]
struct Held {
    file: File,
    path: PathBuf,
}

impl Held {
    fn take(path: &Path, timeout: Duration, mode: Mode) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        let started = Instant::now();
        loop {
            let attempt = match mode {
                Mode::Shared => FileExt::try_lock_shared(&file),
                Mode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            if attempt.is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: started.elapsed(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        // Closing the file releases the lock anyway.
        let _ = FileExt::unlock(&self.file);
    }
}

/// Exclusive lock held while the tree file is rewritten or removed.
#[derive(Debug)]
pub struct TreeLock(Held);

impl TreeLock {
    /// Wait up to `timeout` for exclusive access to `path`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if another holder keeps the lock, or
    /// [`LockError::IoError`] if the lock file cannot be created.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Held::take(path, timeout, Mode::Exclusive).map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }
}

/// Shared lock held while the tree file is read. Any number of readers may
/// hold it at once.
#[derive(Debug)]
pub struct TreeReadLock(Held);

impl TreeReadLock {
    /// Wait up to `timeout` for shared access to `path`.
    ///
    /// # Errors
    ///
    /// Same as [`TreeLock::acquire`].
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Held::take(path, timeout, Mode::Shared).map(Self)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0.path
    }
}
