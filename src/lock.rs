//! Advisory locking for the snapshot work slot.
//!
//! Concurrent invocations over one repository are unsupported; the lock turns
//! an accidental overlap into a wait instead of a corrupted work slot. The
//! lock is released when the guard drops.

use crate::errors::Result;
use crate::paths::RitPaths;
use fs4::fs_std::FileExt;
use std::fs::File;
use std::io::Write;
use tracing::debug;

/// Holds an exclusive lock on the repository's work slot.
pub struct WorkLock {
    /// Keeps the lock file open; the OS releases the lock on drop.
    _file: File,
}

impl WorkLock {
    /// Acquires the work-slot lock, blocking until it is available.
    ///
    /// # Errors
    /// Returns an error if the lock file cannot be created or locked.
    pub fn acquire(paths: &RitPaths) -> Result<Self> {
        let lock_path = paths.lock_file();
        let mut file = File::create(&lock_path)?;
        file.lock_exclusive()?;
        // Best-effort breadcrumb for anyone inspecting a stuck repository.
        let _ = writeln!(file, "pid={}", std::process::id());
        debug!(path = %lock_path.display(), "acquired work-slot lock");
        Ok(Self { _file: file })
    }
}
