//! Reference resolution and ancestry traversal over the object store.

use crate::errors::{Result, RitError};
use crate::store::{Branch, Commit, Head, Store};
use crate::utils::formatters;
use crate::{HEAD_REF, SHORT_HASH_LEN};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// The outcome of resolving a user-supplied reference.
///
/// `head` is set only when the reference was absent or the HEAD sentinel.
/// `branch` is set when the reference (or HEAD) lands on a branch. `commit`
/// is the commit the reference ultimately refers to, absent when nothing
/// matched or the branch has no commit yet.
#[derive(Debug, Clone, Default)]
pub struct ResolvedRef {
    /// The current HEAD, when the reference named it.
    pub head: Option<Head>,
    /// The branch the reference landed on, if any.
    pub branch: Option<Branch>,
    /// The commit the reference resolves to, if any.
    pub commit: Option<Commit>,
}

/// Validates a branch name: non-empty, word characters only, not the HEAD
/// sentinel.
///
/// # Errors
/// Fails with [`RitError::InvalidBranchName`].
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name == HEAD_REF {
        return Err(RitError::InvalidBranchName(name.to_string()));
    }
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(RitError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

/// Resolves a commit reference: exact id first, then unambiguous prefix.
///
/// Prefixes shorter than [`SHORT_HASH_LEN`] are never matched.
///
/// # Errors
/// Fails with [`RitError::AmbiguousReference`] when the prefix matches more
/// than one commit.
pub fn resolve_commit(store: &Store, reference: &str) -> Result<Option<Commit>> {
    debug!(reference, "resolving commit");
    if let Some(commit) = store.commit(reference)? {
        return Ok(Some(commit));
    }
    if reference.len() < SHORT_HASH_LEN || !reference.is_ascii() {
        return Ok(None);
    }
    let index = store.short_prefix_index()?;
    let Some(bucket) = index.get(&reference[..SHORT_HASH_LEN]) else {
        return Ok(None);
    };
    let candidates: Vec<String> = bucket
        .iter()
        .filter(|id| id.starts_with(reference))
        .cloned()
        .collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(store.commit_ensured(only)?)),
        _ => Err(RitError::AmbiguousReference {
            reference: reference.to_string(),
            candidates,
        }),
    }
}

/// Splits a trailing ancestry suffix (`^`, `^^`, `~n`) off a reference.
///
/// Returns the base reference and the number of parent steps. A string with
/// no recognizable suffix comes back whole with zero steps.
fn split_ancestry_suffix(reference: &str) -> (&str, usize) {
    let Some(pos) = reference.find(['^', '~']) else {
        return (reference, 0);
    };
    let (base, suffix) = reference.split_at(pos);
    if suffix.chars().all(|c| c == '^') {
        return (base, suffix.len());
    }
    if let Some(count) = suffix.strip_prefix('~')
        && let Ok(count) = count.parse::<usize>()
    {
        return (base, count);
    }
    (reference, 0)
}

/// Resolves a reference string per the resolution order: HEAD sentinel,
/// branch name, exact commit id, unambiguous prefix. A trailing `^`/`~n`
/// ancestry suffix steps to the parent afterwards; a suffixed result is a
/// bare commit (no branch or HEAD attachment).
///
/// A reference that matches nothing yields a `ResolvedRef` with every field
/// empty; callers decide whether that is an error.
///
/// # Errors
/// Returns an error on store failure, an ambiguous prefix, or an ancestry
/// suffix that walks past the root.
pub fn resolve_ref(store: &Store, reference: Option<&str>) -> Result<ResolvedRef> {
    let Some(raw) = reference else {
        return resolve_plain(store, None);
    };
    let (base, steps) = split_ancestry_suffix(raw);
    if steps == 0 {
        return resolve_plain(store, Some(raw));
    }
    let res = resolve_plain(store, Some(base))?;
    let Some(mut commit) = res.commit else {
        return Err(RitError::UnresolvableRef(raw.to_string()));
    };
    for _ in 0..steps {
        let parent = commit
            .parent_commit_id
            .ok_or_else(|| RitError::UnresolvableRef(raw.to_string()))?;
        commit = store.commit_ensured(&parent)?;
    }
    Ok(ResolvedRef {
        commit: Some(commit),
        ..ResolvedRef::default()
    })
}

fn resolve_plain(store: &Store, reference: Option<&str>) -> Result<ResolvedRef> {
    debug!(?reference, "resolving ref");
    let mut res = ResolvedRef::default();
    match reference {
        None | Some(HEAD_REF) => {
            let head = store.head()?;
            res.head = Some(head.clone());
            match head {
                Head::Branch(name) => {
                    res.branch = store.branch(&name)?;
                    if let Some(branch) = &res.branch {
                        res.commit = store.commit(&branch.commit_id)?;
                    }
                }
                Head::Commit(id) => {
                    res.commit = store.commit(&id)?;
                }
            }
        }
        Some(other) => {
            res.branch = store.branch(other)?;
            if let Some(branch) = &res.branch {
                res.commit = store.commit(&branch.commit_id)?;
            } else {
                res.commit = resolve_commit(store, other)?;
            }
        }
    }
    Ok(res)
}

/// The ancestry chain from `tip` back to its root, tip first.
///
/// # Errors
/// Fails if a parent pointer refers to a missing commit.
pub fn ancestry_chain(store: &Store, tip: &str) -> Result<Vec<Commit>> {
    let mut chain = Vec::new();
    let mut cursor = Some(tip.to_string());
    while let Some(commit_id) = cursor {
        let commit = store.commit_ensured(&commit_id)?;
        cursor = commit.parent_commit_id.clone();
        chain.push(commit);
    }
    Ok(chain)
}

/// Every commit id reachable from `starts` via parent-pointer walks.
///
/// # Errors
/// Fails if a parent pointer refers to a missing commit.
pub fn reachable_from<I>(store: &Store, starts: I) -> Result<HashSet<String>>
where
    I: IntoIterator<Item = String>,
{
    let mut reachable = HashSet::new();
    for start in starts {
        let mut cursor = Some(start);
        while let Some(commit_id) = cursor {
            if !reachable.insert(commit_id.clone()) {
                break;
            }
            cursor = store.commit_ensured(&commit_id)?.parent_commit_id;
        }
    }
    Ok(reachable)
}

/// Removes every commit unreachable from any branch or HEAD.
///
/// A commit is reachable iff some branch or HEAD reaches it via a
/// parent-pointer walk. Removed commits lose their archive and
/// tracking-index files as well. Returns the removed ids, sorted.
///
/// # Errors
/// Returns an error on store failure.
pub fn prune_unreachable(store: &mut Store) -> Result<Vec<String>> {
    let mut starts: Vec<String> = store.branch_to_commit()?.into_values().collect();
    if let Some(head_commit_id) = store.head_commit_id()? {
        starts.push(head_commit_id);
    }
    let reachable = reachable_from(store, starts)?;
    let mut removed: Vec<String> = store
        .commit_ids()?
        .into_iter()
        .filter(|id| !reachable.contains(id))
        .collect();
    removed.sort();
    for commit_id in &removed {
        store.remove_commit(commit_id)?;
    }
    debug!(removed = removed.len(), "pruned unreachable commits");
    Ok(removed)
}

/// One rendered line of a log chain.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// The commit itself.
    pub commit: Commit,
    /// Branch names pointing at this commit; the HEAD sentinel included.
    pub labels: Vec<String>,
    /// Humanized age relative to the walk time.
    pub age: String,
}

/// Builds the log view for a set of starting commits.
///
/// The starting commits that are not ancestors of any other starting commit
/// seed one linear chain each, walked down to the root.
///
/// # Errors
/// Fails if a parent pointer refers to a missing commit.
pub fn log_chains(store: &Store, starts: &[Commit], now: f64) -> Result<Vec<Vec<LogEntry>>> {
    let mut leaves: BTreeSet<String> = BTreeSet::new();
    let mut parents: HashMap<String, Option<String>> = HashMap::new();
    for start in starts {
        if !parents.contains_key(&start.commit_id) {
            leaves.insert(start.commit_id.clone());
        }
        let mut commit = start.clone();
        loop {
            parents.insert(commit.commit_id.clone(), commit.parent_commit_id.clone());
            let Some(parent_id) = commit.parent_commit_id.clone() else {
                break;
            };
            let parent = store.commit_ensured(&parent_id)?;
            leaves.remove(&parent.commit_id);
            commit = parent;
        }
    }

    let decorations = store.commit_to_branches()?;
    let mut chains = Vec::new();
    for leaf in leaves {
        let mut chain = Vec::new();
        let mut cursor = Some(leaf);
        while let Some(commit_id) = cursor {
            let commit = store.commit_ensured(&commit_id)?;
            chain.push(LogEntry {
                labels: decorations.get(&commit_id).cloned().unwrap_or_default(),
                age: formatters::humanize_age(commit.create_time, now),
                commit,
            });
            cursor = parents.get(&commit_id).cloned().flatten();
        }
        chains.push(chain);
    }
    Ok(chains)
}
