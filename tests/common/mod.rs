use anyhow::Result;
use assert_cmd::Command;
use rit::paths::RitPaths;
use rit::store::Store;
use std::path::Path;
use tempfile::TempDir;

/// A `rit` invocation rooted in the given working tree.
pub fn rit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rit").expect("binary under test");
    cmd.current_dir(dir);
    cmd
}

/// Creates a temp working tree with an initialized repository.
pub fn init_repo() -> Result<TempDir> {
    let dir = TempDir::new()?;
    rit(dir.path()).arg("init").assert().success();
    Ok(dir)
}

/// Opens the object store of a test repository.
pub fn open_store(dir: &Path) -> Result<Store> {
    Ok(Store::new(RitPaths::at_root(dir)?))
}

/// The commit id a branch currently points at.
pub fn branch_commit(dir: &Path, name: &str) -> Result<String> {
    let store = open_store(dir)?;
    let branch = store
        .branch(name)?
        .ok_or_else(|| anyhow::anyhow!("branch {name} missing"))?;
    Ok(branch.commit_id)
}

/// The commit id HEAD currently resolves to.
pub fn head_commit(dir: &Path) -> Result<String> {
    let store = open_store(dir)?;
    store
        .head_commit_id()?
        .ok_or_else(|| anyhow::anyhow!("HEAD has no commit"))
}

/// Writes a file and commits it, returning the new commit id.
pub fn commit_file(dir: &Path, file: &str, contents: &str, msg: &str) -> Result<String> {
    std::fs::write(dir.join(file), contents)?;
    rit(dir).args(["commit", msg]).assert().success();
    head_commit(dir)
}
