//! Utility functions and helpers.

/// Short-id and age formatting for log and branch output.
pub mod formatters;

use crate::errors::Result;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Returns the current time as fractional seconds since the Unix epoch.
#[must_use]
pub fn current_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Atomically replaces `path` with `bytes`.
///
/// Writes to a temporary file in the destination directory and renames it
/// into place, so readers never observe a partial record.
///
/// # Errors
/// Returns an error if the temporary file cannot be created, written, or
/// renamed over the destination.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Removes a file, treating an already-missing file as success.
///
/// # Errors
/// Returns any error other than `NotFound`.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_replaces_content() -> crate::errors::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("record");
        atomic_write(&path, b"one")?;
        atomic_write(&path, b"two")?;
        assert_eq!(fs::read(&path)?, b"two");
        Ok(())
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempdir().unwrap();
        assert!(remove_file_if_exists(&dir.path().join("absent")).is_ok());
    }
}
