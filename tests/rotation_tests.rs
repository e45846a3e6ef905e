mod common;

use anyhow::Result;
use common::{branch_commit, commit_file, head_commit, init_repo, open_store, rit};
use predicates::prelude::*;
use rit::backup::policy::{self, RingSide};
use std::fs;

/// Branch names of all periodic levels currently in the store.
fn periodic_branches(dir: &std::path::Path) -> Result<Vec<String>> {
    let store = open_store(dir)?;
    Ok(store
        .branch_names()?
        .into_iter()
        .filter(|name| name.starts_with(policy::PERIODIC_PREFIX))
        .collect())
}

#[test]
fn first_periodic_backup_roots_every_level() -> Result<()> {
    let dir = init_repo()?;
    fs::write(dir.path().join("data.txt"), "payload")?;

    rit(dir.path())
        .args(["backup", "periodic"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Periodic backup"));

    // Four level branches, all fast-forwarded to the same full backup.
    let branches = periodic_branches(dir.path())?;
    assert_eq!(branches.len(), 4);
    let tip = head_commit(dir.path())?;
    for name in &branches {
        assert_eq!(branch_commit(dir.path(), name)?, tip);
    }

    // The full backup is a root commit.
    let store = open_store(dir.path())?;
    let commit = store.commit(&tip)?.expect("backup commit");
    assert_eq!(commit.parent_commit_id, None);
    Ok(())
}

#[test]
fn second_periodic_backup_chains_off_the_first() -> Result<()> {
    let dir = init_repo()?;
    fs::write(dir.path().join("data.txt"), "v1")?;
    rit(dir.path()).args(["backup", "periodic"]).assert().success();
    let first = head_commit(dir.path())?;

    fs::write(dir.path().join("data.txt"), "v2")?;
    rit(dir.path()).args(["backup", "periodic"]).assert().success();
    let second = head_commit(dir.path())?;

    assert_ne!(first, second);
    let store = open_store(dir.path())?;
    let commit = store.commit(&second)?.expect("second backup");
    assert_eq!(commit.parent_commit_id, Some(first));
    Ok(())
}

#[test]
fn quick_backups_rotate_the_ring() -> Result<()> {
    let dir = init_repo()?;

    fs::write(dir.path().join("data.txt"), "v1")?;
    rit(dir.path()).args(["backup", "quick"]).assert().success();
    let q1 = branch_commit(dir.path(), &policy::quick_slot_name(1))?;

    fs::write(dir.path().join("data.txt"), "v2")?;
    rit(dir.path()).args(["backup", "quick"]).assert().success();

    let newest = branch_commit(dir.path(), &policy::quick_slot_name(1))?;
    let shifted = branch_commit(dir.path(), &policy::quick_slot_name(2))?;
    assert_ne!(newest, q1);
    assert_eq!(shifted, q1);
    Ok(())
}

#[test]
fn manual_backup_pins_a_named_branch() -> Result<()> {
    let dir = init_repo()?;
    fs::write(dir.path().join("data.txt"), "keep me")?;

    rit(dir.path())
        .args(["backup", "manual", "pre_upgrade"])
        .assert()
        .success();

    let pinned = branch_commit(dir.path(), &policy::manual_branch_name("pre_upgrade"))?;
    assert_eq!(pinned, head_commit(dir.path())?);

    rit(dir.path())
        .args(["backup", "manual", "bad name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid branch name"));
    Ok(())
}

#[test]
fn restore_records_before_and_after_points() -> Result<()> {
    let dir = init_repo()?;
    let c1 = commit_file(dir.path(), "a.txt", "a", "first")?;
    commit_file(dir.path(), "b.txt", "b", "second")?;

    rit(dir.path())
        .args(["backup", "restore", &c1])
        .assert()
        .success()
        .stderr(predicate::str::contains("Restored to"));

    // The tree is back at the first commit.
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());

    // Slot 1 holds this restore's pair: after is the target, before is the
    // pre-restore snapshot whose tree still had b.txt.
    let after = branch_commit(dir.path(), &policy::restore_slot_name(1, RingSide::After))?;
    assert_eq!(after, c1);
    let before = branch_commit(dir.path(), &policy::restore_slot_name(1, RingSide::Before))?;
    assert_ne!(before, c1);

    let store = open_store(dir.path())?;
    assert!(store.commit(&before)?.is_some());
    Ok(())
}

#[test]
fn repeated_restores_shift_the_ring() -> Result<()> {
    let dir = init_repo()?;
    let c1 = commit_file(dir.path(), "a.txt", "a", "first")?;
    let c2 = commit_file(dir.path(), "b.txt", "b", "second")?;

    rit(dir.path()).args(["backup", "restore", &c1]).assert().success();
    let first_before = branch_commit(dir.path(), &policy::restore_slot_name(1, RingSide::Before))?;

    rit(dir.path()).args(["backup", "restore", &c2]).assert().success();

    // The previous restore point moved to slot 2.
    assert_eq!(
        branch_commit(dir.path(), &policy::restore_slot_name(2, RingSide::Before))?,
        first_before
    );
    assert_eq!(
        branch_commit(dir.path(), &policy::restore_slot_name(2, RingSide::After))?,
        c1
    );
    assert_eq!(
        branch_commit(dir.path(), &policy::restore_slot_name(1, RingSide::After))?,
        c2
    );
    Ok(())
}

#[test]
fn backup_prune_reports_removals() -> Result<()> {
    let dir = init_repo()?;
    fs::write(dir.path().join("data.txt"), "payload")?;
    rit(dir.path()).args(["backup", "periodic"]).assert().success();

    // Nothing has aged out yet, so pruning removes nothing.
    rit(dir.path())
        .args(["backup", "prune"])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 commits removed"));

    let branches = periodic_branches(dir.path())?;
    assert_eq!(branches.len(), 4);
    Ok(())
}
