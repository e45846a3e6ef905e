//! The object store: durable, process-local storage of the four record kinds
//! (commit, branch, HEAD, archive objects) with a read-through cache.
//!
//! Records are small JSON files named by their key; the key itself is never
//! duplicated inside the record. Any write invalidates the whole cache. The
//! cache is process-scoped: an external mutation requires
//! [`Store::clear_cache`] or a fresh process.

use crate::errors::{Result, RitError};
use crate::paths::RitPaths;
use crate::utils::{atomic_write, remove_file_if_exists};
use crate::{DEFAULT_BRANCH, HEAD_REF, SHORT_HASH_LEN};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// A commit: immutable metadata for one snapshot.
///
/// The id is a pure function of the creation time, message, tracking-index
/// bytes, and archive bytes (see [`crate::snapshot::commit_digest`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Hex digest identifying this commit and its archive objects.
    pub commit_id: String,
    /// Parent commit, absent for a root.
    pub parent_commit_id: Option<String>,
    /// Fractional seconds since the Unix epoch.
    pub create_time: f64,
    /// The commit message.
    pub msg: String,
}

/// On-disk commit record; the filename carries the id.
#[derive(Serialize, Deserialize)]
struct CommitRecord {
    parent_commit_id: Option<String>,
    create_time: f64,
    msg: String,
}

/// A branch: a named mutable pointer to a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name (`[A-Za-z0-9_]+`, never the HEAD sentinel).
    pub name: String,
    /// The commit this branch points at.
    pub commit_id: String,
    /// Reserved metadata field; round-trips but is empty today.
    pub info: String,
}

/// On-disk branch record; the filename carries the name.
#[derive(Serialize, Deserialize)]
struct BranchRecord {
    commit_id: String,
    #[serde(default)]
    info: String,
}

/// The HEAD pointer: attached to a branch or detached at a commit.
///
/// An attached HEAD may name a branch with no record yet (the orphan state);
/// a detached HEAD always resolves to an existing commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeadRecord", into = "HeadRecord")]
pub enum Head {
    /// HEAD follows a branch.
    Branch(String),
    /// HEAD is pinned at a commit.
    Commit(String),
}

/// On-disk HEAD record with exactly-one-of semantics.
#[derive(Serialize, Deserialize)]
struct HeadRecord {
    commit_id: Option<String>,
    branch_name: Option<String>,
}

impl From<Head> for HeadRecord {
    fn from(head: Head) -> Self {
        match head {
            Head::Branch(name) => Self {
                commit_id: None,
                branch_name: Some(name),
            },
            Head::Commit(id) => Self {
                commit_id: Some(id),
                branch_name: None,
            },
        }
    }
}

impl TryFrom<HeadRecord> for Head {
    type Error = String;

    fn try_from(record: HeadRecord) -> std::result::Result<Self, String> {
        match (record.branch_name, record.commit_id) {
            (Some(name), None) => Ok(Self::Branch(name)),
            (None, Some(id)) => Ok(Self::Commit(id)),
            _ => Err("HEAD must be a branch name or a commit id".to_string()),
        }
    }
}

/// Everything the store memoizes between writes.
#[derive(Default)]
struct Cache {
    head: Option<Head>,
    commits: HashMap<String, Commit>,
    branches: HashMap<String, Branch>,
    branch_names: Option<Vec<String>>,
    commit_ids: Option<Vec<String>>,
    branch_to_commit: Option<HashMap<String, String>>,
    commit_to_branches: Option<HashMap<String, Vec<String>>>,
    short_index: Option<HashMap<String, Vec<String>>>,
}

/// The object store over one repository.
pub struct Store {
    paths: RitPaths,
    cache: RefCell<Cache>,
}

impl Store {
    /// Creates a store over an already-located repository.
    #[must_use]
    pub fn new(paths: RitPaths) -> Self {
        Self {
            paths,
            cache: RefCell::new(Cache::default()),
        }
    }

    /// The repository's path layout.
    #[must_use]
    pub fn paths(&self) -> &RitPaths {
        &self.paths
    }

    /// Drops every cached record, e.g. after an out-of-band mutation.
    pub fn clear_cache(&self) {
        *self.cache.borrow_mut() = Cache::default();
    }

    /// A handle exposing only the read half of the store.
    #[must_use]
    pub fn view(&self) -> ReadOnlyView<'_> {
        ReadOnlyView { store: self }
    }

    fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record = serde_json::from_str(&text).map_err(|source| RitError::CorruptRecord {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(record))
    }

    fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec(record).map_err(|source| RitError::CorruptRecord {
            path: path.to_path_buf(),
            source,
        })?;
        atomic_write(path, &bytes)
    }

    fn list_dir(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads HEAD; an absent record is an attached HEAD on the default branch.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn head(&self) -> Result<Head> {
        if let Some(head) = &self.cache.borrow().head {
            return Ok(head.clone());
        }
        let head = Self::read_record::<Head>(&self.paths.head_file())?
            .unwrap_or_else(|| Head::Branch(DEFAULT_BRANCH.to_string()));
        self.cache.borrow_mut().head = Some(head.clone());
        Ok(head)
    }

    /// Resolves HEAD down to a commit id.
    ///
    /// Returns `None` when HEAD is attached to a branch with no commit yet.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn head_commit_id(&self) -> Result<Option<String>> {
        match self.head()? {
            Head::Commit(id) => Ok(Some(id)),
            Head::Branch(name) => Ok(self.branch(&name)?.map(|b| b.commit_id)),
        }
    }

    /// Looks up a commit by full id.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn commit(&self, commit_id: &str) -> Result<Option<Commit>> {
        if let Some(commit) = self.cache.borrow().commits.get(commit_id) {
            return Ok(Some(commit.clone()));
        }
        let Some(record) =
            Self::read_record::<CommitRecord>(&self.paths.commit_file(commit_id))?
        else {
            return Ok(None);
        };
        let commit = Commit {
            commit_id: commit_id.to_string(),
            parent_commit_id: record.parent_commit_id,
            create_time: record.create_time,
            msg: record.msg,
        };
        self.cache
            .borrow_mut()
            .commits
            .insert(commit_id.to_string(), commit.clone());
        Ok(Some(commit))
    }

    /// Looks up a commit that graph bookkeeping says must exist.
    ///
    /// # Errors
    /// Fails with [`RitError::UnresolvableRef`] if the record is missing.
    pub fn commit_ensured(&self, commit_id: &str) -> Result<Commit> {
        self.commit(commit_id)?
            .ok_or_else(|| RitError::UnresolvableRef(commit_id.to_string()))
    }

    /// Whether a commit record exists for `commit_id`.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn is_commit(&self, commit_id: &str) -> Result<bool> {
        Ok(self.commit(commit_id)?.is_some())
    }

    /// Looks up a branch by exact name.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn branch(&self, name: &str) -> Result<Option<Branch>> {
        if let Some(branch) = self.cache.borrow().branches.get(name) {
            return Ok(Some(branch.clone()));
        }
        let Some(record) = Self::read_record::<BranchRecord>(&self.paths.branch_file(name))?
        else {
            return Ok(None);
        };
        let branch = Branch {
            name: name.to_string(),
            commit_id: record.commit_id,
            info: record.info,
        };
        self.cache
            .borrow_mut()
            .branches
            .insert(name.to_string(), branch.clone());
        Ok(Some(branch))
    }

    /// Whether a branch record exists for `name`.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn is_branch(&self, name: &str) -> Result<bool> {
        Ok(self.branch(name)?.is_some())
    }

    /// Every branch name, sorted.
    ///
    /// # Errors
    /// Returns an error if the branches directory cannot be read.
    pub fn branch_names(&self) -> Result<Vec<String>> {
        if let Some(names) = &self.cache.borrow().branch_names {
            return Ok(names.clone());
        }
        let names = Self::list_dir(&self.paths.branches)?;
        self.cache.borrow_mut().branch_names = Some(names.clone());
        Ok(names)
    }

    /// Every commit id, sorted.
    ///
    /// # Errors
    /// Returns an error if the commits directory cannot be read.
    pub fn commit_ids(&self) -> Result<Vec<String>> {
        if let Some(ids) = &self.cache.borrow().commit_ids {
            return Ok(ids.clone());
        }
        let ids = Self::list_dir(&self.paths.commits)?;
        self.cache.borrow_mut().commit_ids = Some(ids.clone());
        Ok(ids)
    }

    fn populate_branch_maps(&self) -> Result<()> {
        let mut branch_to_commit = HashMap::new();
        let mut commit_to_branches: HashMap<String, Vec<String>> = HashMap::new();
        for name in self.branch_names()? {
            let branch = self
                .branch(&name)?
                .ok_or_else(|| RitError::BranchNotFound(name.clone()))?;
            branch_to_commit.insert(name.clone(), branch.commit_id.clone());
            commit_to_branches
                .entry(branch.commit_id)
                .or_default()
                .push(name);
        }
        // HEAD joins the map as a synthetic entry when it resolves.
        if let Some(head_commit_id) = self.head_commit_id()? {
            branch_to_commit.insert(HEAD_REF.to_string(), head_commit_id.clone());
            commit_to_branches
                .entry(head_commit_id)
                .or_default()
                .push(HEAD_REF.to_string());
        }
        let mut cache = self.cache.borrow_mut();
        cache.branch_to_commit = Some(branch_to_commit);
        cache.commit_to_branches = Some(commit_to_branches);
        Ok(())
    }

    /// Branch name → commit id, with the HEAD sentinel as a synthetic entry.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn branch_to_commit(&self) -> Result<HashMap<String, String>> {
        if let Some(map) = &self.cache.borrow().branch_to_commit {
            return Ok(map.clone());
        }
        self.populate_branch_maps()?;
        Ok(self
            .cache
            .borrow()
            .branch_to_commit
            .clone()
            .unwrap_or_default())
    }

    /// Commit id → branch names, with the HEAD sentinel as a synthetic entry.
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn commit_to_branches(&self) -> Result<HashMap<String, Vec<String>>> {
        if let Some(map) = &self.cache.borrow().commit_to_branches {
            return Ok(map.clone());
        }
        self.populate_branch_maps()?;
        Ok(self
            .cache
            .borrow()
            .commit_to_branches
            .clone()
            .unwrap_or_default())
    }

    /// Maps each id's first [`SHORT_HASH_LEN`] characters to the full ids
    /// sharing that prefix.
    ///
    /// # Errors
    /// Returns an error if the commits directory cannot be read.
    pub fn short_prefix_index(&self) -> Result<HashMap<String, Vec<String>>> {
        if let Some(index) = &self.cache.borrow().short_index {
            return Ok(index.clone());
        }
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for commit_id in self.commit_ids()? {
            let prefix = commit_id[..SHORT_HASH_LEN.min(commit_id.len())].to_string();
            index.entry(prefix).or_default().push(commit_id);
        }
        self.cache.borrow_mut().short_index = Some(index.clone());
        Ok(index)
    }

    /// Writes a commit record.
    ///
    /// Idempotent when the identical commit is already stored.
    ///
    /// # Errors
    /// Fails with [`RitError::HashCollision`] if a different commit occupies
    /// the same id, or [`RitError::UnresolvableRef`] if the parent is not in
    /// the store.
    pub fn set_commit(&mut self, commit: Commit) -> Result<()> {
        if let Some(existing) = self.commit(&commit.commit_id)? {
            if existing == commit {
                return Ok(());
            }
            return Err(RitError::HashCollision(commit.commit_id));
        }
        if let Some(parent) = &commit.parent_commit_id
            && !self.is_commit(parent)?
        {
            return Err(RitError::UnresolvableRef(parent.clone()));
        }
        debug!(commit_id = %commit.commit_id, "writing commit");
        let record = CommitRecord {
            parent_commit_id: commit.parent_commit_id.clone(),
            create_time: commit.create_time,
            msg: commit.msg.clone(),
        };
        Self::write_record(&self.paths.commit_file(&commit.commit_id), &record)?;
        self.clear_cache();
        Ok(())
    }

    /// Writes a branch record, creating or moving the branch.
    ///
    /// # Errors
    /// Fails with [`RitError::NameShadowsCommit`] if the name equals a stored
    /// commit id, or [`RitError::UnresolvableRef`] if the target commit does
    /// not exist.
    pub fn set_branch(&mut self, branch: Branch) -> Result<()> {
        if self.is_commit(&branch.name)? {
            return Err(RitError::NameShadowsCommit(branch.name));
        }
        if !self.is_commit(&branch.commit_id)? {
            return Err(RitError::UnresolvableRef(branch.commit_id));
        }
        debug!(name = %branch.name, commit_id = %branch.commit_id, "writing branch");
        let record = BranchRecord {
            commit_id: branch.commit_id.clone(),
            info: branch.info.clone(),
        };
        Self::write_record(&self.paths.branch_file(&branch.name), &record)?;
        self.clear_cache();
        Ok(())
    }

    /// Deletes a branch record; returns whether it existed.
    ///
    /// # Errors
    /// Returns an error on I/O failure.
    pub fn delete_branch(&mut self, name: &str) -> Result<bool> {
        let existed = match fs::remove_file(self.paths.branch_file(name)) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        debug!(branch = name, existed, "deleted branch");
        self.clear_cache();
        Ok(existed)
    }

    /// Rewrites the HEAD record.
    ///
    /// # Errors
    /// Returns an error on I/O failure.
    pub fn set_head(&mut self, head: Head) -> Result<()> {
        debug!(?head, "writing HEAD");
        Self::write_record(&self.paths.head_file(), &head)?;
        self.clear_cache();
        Ok(())
    }

    /// Removes a commit record along with its archive and tracking index.
    ///
    /// # Errors
    /// Returns an error on I/O failure.
    pub fn remove_commit(&mut self, commit_id: &str) -> Result<()> {
        debug!(commit_id, "removing commit and archive objects");
        remove_file_if_exists(&self.paths.commit_file(commit_id))?;
        remove_file_if_exists(&self.paths.archive_file(commit_id))?;
        remove_file_if_exists(&self.paths.index_file(commit_id))?;
        self.clear_cache();
        Ok(())
    }
}

/// A borrow of the store exposing only read operations.
///
/// Handed to callers that must not mutate, e.g. the `query` operation.
pub struct ReadOnlyView<'a> {
    store: &'a Store,
}

impl ReadOnlyView<'_> {
    /// See [`Store::paths`].
    #[must_use]
    pub fn paths(&self) -> &RitPaths {
        self.store.paths()
    }

    /// See [`Store::head`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn head(&self) -> Result<Head> {
        self.store.head()
    }

    /// See [`Store::head_commit_id`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn head_commit_id(&self) -> Result<Option<String>> {
        self.store.head_commit_id()
    }

    /// See [`Store::commit`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn commit(&self, commit_id: &str) -> Result<Option<Commit>> {
        self.store.commit(commit_id)
    }

    /// See [`Store::branch`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn branch(&self, name: &str) -> Result<Option<Branch>> {
        self.store.branch(name)
    }

    /// See [`Store::branch_names`].
    ///
    /// # Errors
    /// Returns an error on I/O failure.
    pub fn branch_names(&self) -> Result<Vec<String>> {
        self.store.branch_names()
    }

    /// See [`Store::commit_ids`].
    ///
    /// # Errors
    /// Returns an error on I/O failure.
    pub fn commit_ids(&self) -> Result<Vec<String>> {
        self.store.commit_ids()
    }

    /// See [`Store::branch_to_commit`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn branch_to_commit(&self) -> Result<HashMap<String, String>> {
        self.store.branch_to_commit()
    }

    /// See [`Store::commit_to_branches`].
    ///
    /// # Errors
    /// Returns an error on I/O failure or a corrupt record.
    pub fn commit_to_branches(&self) -> Result<HashMap<String, Vec<String>>> {
        self.store.commit_to_branches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_id(fill: char) -> String {
        std::iter::repeat_n(fill, crate::FULL_HASH_LEN).collect()
    }

    fn fake_commit(id: &str, parent: Option<&str>, msg: &str) -> Commit {
        Commit {
            commit_id: id.to_string(),
            parent_commit_id: parent.map(str::to_string),
            create_time: 1_700_000_000.0,
            msg: msg.to_string(),
        }
    }

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let paths = RitPaths::init(dir.path()).unwrap();
        (dir, Store::new(paths))
    }

    #[test]
    fn default_head_is_main() -> Result<()> {
        let (_dir, store) = store();
        assert_eq!(store.head()?, Head::Branch(DEFAULT_BRANCH.to_string()));
        assert_eq!(store.head_commit_id()?, None);
        Ok(())
    }

    #[test]
    fn head_round_trips_both_shapes() -> Result<()> {
        let (_dir, mut store) = store();
        store.set_head(Head::Branch("dev".to_string()))?;
        assert_eq!(store.head()?, Head::Branch("dev".to_string()));

        let id = fake_id('a');
        store.set_commit(fake_commit(&id, None, "root"))?;
        store.set_head(Head::Commit(id.clone()))?;
        assert_eq!(store.head()?, Head::Commit(id));
        Ok(())
    }

    #[test]
    fn head_record_rejects_both_or_neither() {
        let both: std::result::Result<Head, _> = serde_json::from_str(
            r#"{"commit_id": "abc", "branch_name": "main"}"#,
        );
        assert!(both.is_err());
        let neither: std::result::Result<Head, _> =
            serde_json::from_str(r#"{"commit_id": null, "branch_name": null}"#);
        assert!(neither.is_err());
    }

    #[test]
    fn commit_round_trip_and_idempotency() -> Result<()> {
        let (_dir, mut store) = store();
        let id = fake_id('a');
        let commit = fake_commit(&id, None, "root");
        store.set_commit(commit.clone())?;
        store.set_commit(commit.clone())?;
        assert_eq!(store.commit(&id)?, Some(commit));
        Ok(())
    }

    #[test]
    fn differing_content_at_same_id_collides() -> Result<()> {
        let (_dir, mut store) = store();
        let id = fake_id('a');
        store.set_commit(fake_commit(&id, None, "one"))?;
        assert!(matches!(
            store.set_commit(fake_commit(&id, None, "two")),
            Err(RitError::HashCollision(_))
        ));
        Ok(())
    }

    #[test]
    fn commit_requires_stored_parent() -> Result<()> {
        let (_dir, mut store) = store();
        let orphan = fake_commit(&fake_id('b'), Some(&fake_id('a')), "child");
        assert!(matches!(
            store.set_commit(orphan),
            Err(RitError::UnresolvableRef(_))
        ));
        Ok(())
    }

    #[test]
    fn branch_name_must_not_shadow_commit() -> Result<()> {
        let (_dir, mut store) = store();
        let id = fake_id('a');
        store.set_commit(fake_commit(&id, None, "root"))?;
        let shadow = Branch {
            name: id.clone(),
            commit_id: id,
            info: String::new(),
        };
        assert!(matches!(
            store.set_branch(shadow),
            Err(RitError::NameShadowsCommit(_))
        ));
        Ok(())
    }

    #[test]
    fn branch_maps_are_inverse_and_include_head() -> Result<()> {
        let (_dir, mut store) = store();
        let a = fake_id('a');
        let b = fake_id('b');
        store.set_commit(fake_commit(&a, None, "root"))?;
        store.set_commit(fake_commit(&b, Some(&a), "tip"))?;
        store.set_branch(Branch {
            name: "main".to_string(),
            commit_id: b.clone(),
            info: String::new(),
        })?;
        store.set_branch(Branch {
            name: "old".to_string(),
            commit_id: a.clone(),
            info: String::new(),
        })?;

        let forward = store.branch_to_commit()?;
        let reverse = store.commit_to_branches()?;
        for (name, commit_id) in &forward {
            assert!(reverse[commit_id].contains(name));
        }
        // HEAD is attached to main, so the sentinel resolves to b.
        assert_eq!(forward[HEAD_REF], b);
        assert!(reverse[&b].contains(&HEAD_REF.to_string()));
        assert_eq!(forward["old"], a);
        Ok(())
    }

    #[test]
    fn prefix_index_groups_by_short_prefix() -> Result<()> {
        let (_dir, mut store) = store();
        let a = format!("aaaaaaa{}", "0".repeat(33));
        let b = format!("aaaaaaa{}", "1".repeat(33));
        let c = fake_id('c');
        store.set_commit(fake_commit(&a, None, "a"))?;
        store.set_commit(fake_commit(&b, None, "b"))?;
        store.set_commit(fake_commit(&c, None, "c"))?;

        let index = store.short_prefix_index()?;
        assert_eq!(index["aaaaaaa"].len(), 2);
        assert_eq!(index[&c[..SHORT_HASH_LEN]], vec![c]);
        Ok(())
    }

    #[test]
    fn writes_invalidate_listings() -> Result<()> {
        let (_dir, mut store) = store();
        let a = fake_id('a');
        store.set_commit(fake_commit(&a, None, "root"))?;
        assert_eq!(store.commit_ids()?.len(), 1);

        let b = fake_id('b');
        store.set_commit(fake_commit(&b, Some(&a), "tip"))?;
        assert_eq!(store.commit_ids()?.len(), 2);

        store.set_branch(Branch {
            name: "dev".to_string(),
            commit_id: b,
            info: String::new(),
        })?;
        assert_eq!(store.branch_names()?, vec!["dev".to_string()]);
        assert!(store.delete_branch("dev")?);
        assert!(!store.delete_branch("dev")?);
        assert!(store.branch_names()?.is_empty());
        Ok(())
    }

    #[test]
    fn remove_commit_drops_archive_objects() -> Result<()> {
        let (_dir, mut store) = store();
        let id = fake_id('a');
        store.set_commit(fake_commit(&id, None, "root"))?;
        fs::write(store.paths().archive_file(&id), b"archive")?;
        fs::write(store.paths().index_file(&id), b"index")?;

        store.remove_commit(&id)?;
        assert_eq!(store.commit(&id)?, None);
        assert!(!store.paths().archive_file(&id).exists());
        assert!(!store.paths().index_file(&id).exists());
        Ok(())
    }
}
