//! Exclusive advisory lock on a dedicated lock file.

use std::fs::{File, OpenOptions};
use std::path::Path;

use nix::fcntl::{Flock, FlockArg};

use crate::error::{RccError, Result};

/// Holds an exclusive `flock` on a lock file.
///
/// The lock is released when the guard is dropped, so every early return
/// out of a locked section unlocks.
pub struct FileLock {
    _flock: Flock<File>,
}

impl FileLock {
    /// Open `path` (creating it if needed) and block until the exclusive
    /// lock is granted. There is no timeout.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| RccError::io("lock file creation failed for", path, e))?;

        let flock = Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
            RccError::Lock {
                path: path.to_path_buf(),
                source: errno,
            }
        })?;

        Ok(Self { _flock: flock })
    }

    /// Release the lock now.
    pub fn release(self) {
        drop(self);
    }
}
