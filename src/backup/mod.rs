//! Tiered backup rotation layered on the commit graph and snapshot protocol.
//!
//! Periodic snapshots land on time-bucketed level branches: the coarsest
//! level is a full backup and each finer level chains off the coarser one.
//! Two fixed-length rings (restore points and quick backups) shift by one
//! slot per invocation, and manual backups pin a commit under a user-chosen
//! name forever.

/// Level decomposition and branch naming.
pub mod policy;

use crate::config::BackupConfig;
use crate::errors::{Result, RitError};
use crate::graph;
use crate::snapshot;
use crate::store::{Branch, Commit, Head, Store};
use crate::utils::formatters;
use policy::RingSide;
use tracing::{debug, info};

/// The two commits recorded by one restore-point invocation.
#[derive(Debug, Clone)]
pub struct RestorePoint {
    /// Snapshot of the tree taken just before the restore.
    pub before: Commit,
    /// The commit the tree was restored to.
    pub after: Commit,
}

/// Takes a periodic snapshot of the working tree.
///
/// Walks the level branches coarsest to finest and finds the deepest
/// contiguously-existing one (the base). With no base, the coarsest branch
/// is orphan-rooted and receives a full backup. With a base and missing
/// finer levels, HEAD detaches at the base commit so the base branch stays
/// pinned while the new commit chains off its index. With every level
/// present, HEAD attaches to the finest branch and the commit extends it.
/// All missing level branches are then fast-forwarded to the new commit.
///
/// # Errors
/// Returns an error on store or archive-tool failure.
pub fn create_periodic(store: &mut Store, now: f64, msg: Option<&str>) -> Result<Commit> {
    let names = policy::level_branch_names(formatters::datetime_from_epoch(now));
    let mut base: Option<Branch> = None;
    let mut first_missing = names.len();
    for (level, name) in names.iter().enumerate() {
        match store.branch(name)? {
            Some(branch) => base = Some(branch),
            None => {
                first_missing = level;
                break;
            }
        }
    }
    debug!(levels = names.len(), first_missing, "periodic snapshot plan");

    let commit = match &base {
        None => {
            // Nothing for this bucket yet: orphan-root a fresh chain on the
            // coarsest branch.
            store.set_head(Head::Branch(names[0].clone()))?;
            snapshot::create_commit(store, now, msg.unwrap_or("Full periodic backup"), false)?
        }
        Some(base) if first_missing < names.len() => {
            // Chain off the finest existing level without moving it.
            store.set_head(Head::Commit(base.commit_id.clone()))?;
            snapshot::create_commit(
                store,
                now,
                msg.unwrap_or("Incremental periodic backup"),
                false,
            )?
        }
        Some(base) => {
            // Every level exists: append to the finest chain.
            store.set_head(Head::Branch(base.name.clone()))?;
            snapshot::create_commit(
                store,
                now,
                msg.unwrap_or("Extension periodic backup"),
                false,
            )?
        }
    };

    for name in &names[first_missing..] {
        // The orphan-root case already materialized the coarsest branch.
        if store.branch(name)?.as_ref().map(|b| &b.commit_id) == Some(&commit.commit_id) {
            continue;
        }
        store.set_branch(Branch {
            name: name.clone(),
            commit_id: commit.commit_id.clone(),
            info: String::new(),
        })?;
    }
    info!(commit_id = %commit.commit_id, "periodic snapshot complete");
    Ok(commit)
}

/// Deletes aged-out periodic branches, then prunes unreachable commits.
///
/// A level branch expires when its configured maximum age is positive and
/// its commit is older than `now - max_age`. Manual and ring branches are
/// untouched. Returns the pruned commit ids.
///
/// # Errors
/// Returns an error on store failure.
pub fn prune_periodic(store: &mut Store, config: &BackupConfig, now: f64) -> Result<Vec<String>> {
    for (level, max_age) in config.level_max_ages.iter().enumerate() {
        if *max_age <= 0.0 {
            continue;
        }
        let prefix = policy::periodic_level_prefix(level);
        for name in store.branch_names()? {
            if !name.starts_with(&prefix) {
                continue;
            }
            let Some(branch) = store.branch(&name)? else {
                continue;
            };
            let commit = store.commit_ensured(&branch.commit_id)?;
            if commit.create_time < now - max_age {
                debug!(branch = %name, age = now - commit.create_time, "expiring level branch");
                store.delete_branch(&name)?;
            }
        }
    }
    graph::prune_unreachable(store)
}

/// Shifts an N-slot ring down by one and writes `newest` into slot 1.
fn shift_ring<F>(store: &mut Store, slots: usize, name_of: F, newest: &str) -> Result<()>
where
    F: Fn(usize) -> String,
{
    if slots == 0 {
        return Ok(());
    }
    for slot in (1..slots).rev() {
        if let Some(branch) = store.branch(&name_of(slot))? {
            store.set_branch(Branch {
                name: name_of(slot + 1),
                commit_id: branch.commit_id,
                info: String::new(),
            })?;
        }
    }
    store.set_branch(Branch {
        name: name_of(1),
        commit_id: newest.to_string(),
        info: String::new(),
    })
}

/// Restores the working tree to `reference` with a safety net.
///
/// Takes a "Before restoration" periodic snapshot, hard-checks-out the
/// target, and shifts the restore ring so slot 1 holds the before/after
/// pair of this restore.
///
/// # Errors
/// Fails with [`RitError::UnresolvableRef`] when the reference does not
/// resolve to a commit, or on store/archive-tool failure.
pub fn restore_to_point(
    store: &mut Store,
    config: &BackupConfig,
    reference: &str,
    now: f64,
) -> Result<RestorePoint> {
    let resolved = graph::resolve_ref(store, Some(reference))?;
    let target = resolved
        .commit
        .ok_or_else(|| RitError::UnresolvableRef(reference.to_string()))?;

    let before = create_periodic(store, now, Some("Before restoration"))?;

    snapshot::restore_working_tree(store, &target.commit_id)?;
    match resolved.branch {
        Some(branch) => store.set_head(Head::Branch(branch.name))?,
        None => store.set_head(Head::Commit(target.commit_id.clone()))?,
    }

    shift_ring(
        store,
        config.restore_slots,
        |slot| policy::restore_slot_name(slot, RingSide::Before),
        &before.commit_id,
    )?;
    shift_ring(
        store,
        config.restore_slots,
        |slot| policy::restore_slot_name(slot, RingSide::After),
        &target.commit_id,
    )?;
    info!(target = %target.commit_id, "restore point recorded");
    Ok(RestorePoint {
        before,
        after: target,
    })
}

/// Takes a periodic snapshot and rotates it into the quick ring.
///
/// # Errors
/// Returns an error on store or archive-tool failure.
pub fn quick_backup(store: &mut Store, config: &BackupConfig, now: f64) -> Result<Commit> {
    let commit = create_periodic(store, now, Some("Quick backup"))?;
    shift_ring(store, config.quick_slots, policy::quick_slot_name, &commit.commit_id)?;
    Ok(commit)
}

/// Takes a periodic snapshot and pins it under `manual__<name>`.
///
/// Manual branches are never pruned.
///
/// # Errors
/// Fails with [`RitError::InvalidBranchName`] for a malformed name, or on
/// store/archive-tool failure.
pub fn manual_backup(store: &mut Store, name: &str, now: f64) -> Result<Commit> {
    graph::validate_branch_name(name)?;
    let commit = create_periodic(store, now, Some(&format!("Manual backup: {name}")))?;
    store.set_branch(Branch {
        name: policy::manual_branch_name(name),
        commit_id: commit.commit_id.clone(),
        info: String::new(),
    })?;
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::RitPaths;
    use tempfile::tempdir;

    fn fake_id(tag: usize) -> String {
        format!("{tag:040x}")
    }

    fn seeded_store(commits: usize) -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let mut store = Store::new(RitPaths::init(dir.path()).unwrap());
        for i in 0..commits {
            let parent = (i > 0).then(|| fake_id(i - 1));
            store
                .set_commit(Commit {
                    commit_id: fake_id(i),
                    parent_commit_id: parent,
                    create_time: 1_000.0 + i as f64,
                    msg: format!("c{i}"),
                })
                .unwrap();
        }
        (dir, store)
    }

    fn ring_commit(store: &Store, slot: usize, side: RingSide) -> Option<String> {
        store
            .branch(&policy::restore_slot_name(slot, side))
            .unwrap()
            .map(|b| b.commit_id)
    }

    #[test]
    fn ring_shift_moves_slots_and_caps_at_n() -> Result<()> {
        let (_dir, mut store) = seeded_store(4);
        let name_of = |slot: usize| policy::restore_slot_name(slot, RingSide::Before);

        // Fill the three-slot ring one shift at a time.
        for i in 0..4 {
            shift_ring(&mut store, 3, name_of, &fake_id(i))?;
        }

        // Newest first, oldest entry has fallen off.
        assert_eq!(ring_commit(&store, 1, RingSide::Before), Some(fake_id(3)));
        assert_eq!(ring_commit(&store, 2, RingSide::Before), Some(fake_id(2)));
        assert_eq!(ring_commit(&store, 3, RingSide::Before), Some(fake_id(1)));
        assert!(store.branch(&name_of(4))?.is_none());
        Ok(())
    }

    #[test]
    fn zero_slot_ring_is_disabled() -> Result<()> {
        let (_dir, mut store) = seeded_store(1);
        shift_ring(&mut store, 0, policy::quick_slot_name, &fake_id(0))?;
        assert!(store.branch(&policy::quick_slot_name(1))?.is_none());
        Ok(())
    }

    #[test]
    fn expired_level_branches_are_deleted_and_pruned() -> Result<()> {
        let (_dir, mut store) = seeded_store(2);
        // Two independent roots so pruning one branch orphans one commit.
        store.set_commit(Commit {
            commit_id: fake_id(99),
            parent_commit_id: None,
            create_time: 1_000.0,
            msg: "old root".to_string(),
        })?;
        store.set_branch(Branch {
            name: "periodic__lvl_1__2020_01_01".to_string(),
            commit_id: fake_id(99),
            info: String::new(),
        })?;
        store.set_branch(Branch {
            name: "main".to_string(),
            commit_id: fake_id(1),
            info: String::new(),
        })?;

        let config = BackupConfig {
            // Level 1 expires after 100 seconds; level 0 never.
            level_max_ages: vec![0.0, 100.0],
            ..BackupConfig::default()
        };
        let removed = prune_periodic(&mut store, &config, 2_000.0)?;

        assert!(store.branch("periodic__lvl_1__2020_01_01")?.is_none());
        assert_eq!(removed, vec![fake_id(99)]);
        assert!(store.branch("main")?.is_some());
        Ok(())
    }

    #[test]
    fn manual_names_are_validated() {
        let (_dir, mut store) = seeded_store(1);
        assert!(matches!(
            manual_backup(&mut store, "bad name", 1_000.0),
            Err(RitError::InvalidBranchName(_))
        ));
    }
}
