//! Repository layout and discovery.
//!
//! A repository is a working tree containing the hidden administrative
//! subtree `.rit/`. Discovery walks parent directories from a starting point
//! until it finds one; the root is always canonicalized before use.

use crate::errors::{Result, RitError};
use crate::{ARCHIVE_EXT, HEAD_REF, INDEX_EXT, RIT_DIR_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Canonical locations inside a repository.
#[derive(Debug, Clone)]
pub struct RitPaths {
    /// The working tree being snapshotted.
    pub root: PathBuf,
    /// The administrative subtree (`<root>/.rit`).
    pub rit_dir: PathBuf,
    /// One record per branch, keyed by branch name.
    pub branches: PathBuf,
    /// One record per commit, keyed by commit id.
    pub commits: PathBuf,
    /// Archive and tracking-index files, keyed by commit id.
    pub backups: PathBuf,
    /// Process-private scratch slot for in-flight archives.
    pub work: PathBuf,
}

impl RitPaths {
    /// Builds the path set for a known root, creating missing subdirectories.
    ///
    /// # Errors
    /// Returns an error if the root cannot be canonicalized or a
    /// subdirectory cannot be created.
    pub fn at_root(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let rit_dir = root.join(RIT_DIR_NAME);
        let branches = rit_dir.join("branches");
        let commits = rit_dir.join("commits");
        let backups = rit_dir.join("backups");
        let work = backups.join("work");
        for dir in [&branches, &commits, &backups, &work] {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            root,
            rit_dir,
            branches,
            commits,
            backups,
            work,
        })
    }

    /// Initializes a new repository at `root`.
    ///
    /// # Errors
    /// Fails with [`RitError::AlreadyInitialized`] if the administrative
    /// subtree already exists.
    pub fn init(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().canonicalize()?;
        let rit_dir = root.join(RIT_DIR_NAME);
        if rit_dir.exists() {
            return Err(RitError::AlreadyInitialized(rit_dir));
        }
        fs::create_dir(&rit_dir)?;
        debug!(rit_dir = %rit_dir.display(), "initialized repository");
        Self::at_root(root)
    }

    /// Locates the enclosing repository by walking parent directories.
    ///
    /// # Errors
    /// Fails with [`RitError::NotARepository`] when no ancestor of `start`
    /// contains the administrative subtree.
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let start = start.as_ref().canonicalize()?;
        let mut dir = start.as_path();
        loop {
            if dir.join(RIT_DIR_NAME).is_dir() {
                debug!(root = %dir.display(), "located repository");
                return Self::at_root(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(RitError::NotARepository(start)),
            }
        }
    }

    /// Path of the HEAD record.
    #[must_use]
    pub fn head_file(&self) -> PathBuf {
        self.rit_dir.join(HEAD_REF)
    }

    /// Path of a branch record.
    #[must_use]
    pub fn branch_file(&self, name: &str) -> PathBuf {
        self.branches.join(name)
    }

    /// Path of a commit record.
    #[must_use]
    pub fn commit_file(&self, commit_id: &str) -> PathBuf {
        self.commits.join(commit_id)
    }

    /// Path of a commit's compressed archive.
    #[must_use]
    pub fn archive_file(&self, commit_id: &str) -> PathBuf {
        self.backups.join(format!("{commit_id}.{ARCHIVE_EXT}"))
    }

    /// Path of a commit's tracking index.
    #[must_use]
    pub fn index_file(&self, commit_id: &str) -> PathBuf {
        self.backups.join(format!("{commit_id}.{INDEX_EXT}"))
    }

    /// Path of the rotation-policy configuration file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.rit_dir.join("config.toml")
    }

    /// Path of the advisory work-slot lock file.
    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.rit_dir.join("lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_creates_layout() -> Result<()> {
        let dir = tempdir()?;
        let paths = RitPaths::init(dir.path())?;
        assert!(paths.rit_dir.is_dir());
        assert!(paths.branches.is_dir());
        assert!(paths.commits.is_dir());
        assert!(paths.backups.is_dir());
        assert!(paths.work.is_dir());
        Ok(())
    }

    #[test]
    fn init_twice_fails() -> Result<()> {
        let dir = tempdir()?;
        RitPaths::init(dir.path())?;
        assert!(matches!(
            RitPaths::init(dir.path()),
            Err(RitError::AlreadyInitialized(_))
        ));
        Ok(())
    }

    #[test]
    fn discover_walks_parents() -> Result<()> {
        let dir = tempdir()?;
        RitPaths::init(dir.path())?;
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested)?;
        let paths = RitPaths::discover(&nested)?;
        assert_eq!(paths.root, dir.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn discover_outside_repository_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            RitPaths::discover(dir.path()),
            Err(RitError::NotARepository(_))
        ));
    }
}
