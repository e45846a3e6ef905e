use crate::backup;
use crate::config::Config;
use crate::errors::Result;
use crate::output;
use crate::paths::RitPaths;
use crate::store::Store;
use crate::utils::{self, formatters};
use colored::Colorize;

/// Takes a periodic snapshot at the appropriate level branches.
///
/// # Errors
/// Returns an error on store or archive-tool failure.
pub fn periodic(paths: &RitPaths) -> Result<()> {
    let mut store = Store::new(paths.clone());
    let commit = backup::create_periodic(&mut store, utils::current_timestamp(), None)?;
    output::success(&format!(
        "Periodic backup at {}: {}",
        formatters::short_id(&commit.commit_id).yellow(),
        commit.msg
    ));
    Ok(())
}

/// Expires aged-out periodic branches and prunes unreachable commits.
///
/// # Errors
/// Returns an error on store failure.
pub fn prune(paths: &RitPaths) -> Result<()> {
    let config = Config::load(&paths.config_file())?;
    let mut store = Store::new(paths.clone());
    let removed = backup::prune_periodic(&mut store, &config.backup, utils::current_timestamp())?;
    output::success(&format!("Expired backups pruned, {} commits removed", removed.len()));
    Ok(())
}

/// Restores the tree to a reference, recording the before/after pair in the
/// restore ring.
///
/// # Errors
/// Returns an error when the reference does not resolve or on
/// store/archive-tool failure.
pub fn restore(paths: &RitPaths, reference: &str) -> Result<()> {
    let config = Config::load(&paths.config_file())?;
    let mut store = Store::new(paths.clone());
    let point = backup::restore_to_point(
        &mut store,
        &config.backup,
        reference,
        utils::current_timestamp(),
    )?;
    output::success(&format!(
        "Restored to {} (pre-restore state saved as {})",
        formatters::short_id(&point.after.commit_id).yellow(),
        formatters::short_id(&point.before.commit_id).yellow()
    ));
    Ok(())
}

/// Takes a quick backup and rotates the quick ring.
///
/// # Errors
/// Returns an error on store or archive-tool failure.
pub fn quick(paths: &RitPaths) -> Result<()> {
    let config = Config::load(&paths.config_file())?;
    let mut store = Store::new(paths.clone());
    let commit = backup::quick_backup(&mut store, &config.backup, utils::current_timestamp())?;
    output::success(&format!(
        "Quick backup at {}",
        formatters::short_id(&commit.commit_id).yellow()
    ));
    Ok(())
}

/// Takes a backup pinned under `manual__<name>`.
///
/// # Errors
/// Returns an error for an invalid name or on store/archive-tool failure.
pub fn manual(paths: &RitPaths, name: &str) -> Result<()> {
    let mut store = Store::new(paths.clone());
    let commit = backup::manual_backup(&mut store, name, utils::current_timestamp())?;
    output::success(&format!(
        "Manual backup '{}' at {}",
        name.green(),
        formatters::short_id(&commit.commit_id).yellow()
    ));
    Ok(())
}
