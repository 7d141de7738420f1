//! Advisory single-writer lock
//!
//! Every writable open takes an exclusive advisory lock on the `lock` file
//! inside the database directory; a second writer gets a permission error
//! instead of silently racing. Read-only opens never touch it. The lock is
//! released when the guard drops, on every exit path.

use std::fs::OpenOptions;
use std::path::Path;

use fs2::FileExt;

use crate::error::{BaseError, Result};

/// Held for the lifetime of a writable database handle
#[derive(Debug)]
pub struct WriterLock {
    file: std::fs::File,
}

impl WriterLock {
    /// Acquire the lock, failing immediately if another writer holds it
    pub fn acquire(dir: &Path) -> Result<WriterLock> {
        let path = dir.join("lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| BaseError::Locked(path))?;
        Ok(WriterLock { file })
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        // Best effort; the OS drops the lock with the descriptor anyway.
        let _ = self.file.unlock();
    }
}
