use crate::errors::Result;
use crate::output;
use crate::paths::RitPaths;
use crate::snapshot;
use crate::store::{Commit, Store};
use crate::utils::{self, formatters};
use colored::Colorize;

/// Creates a commit from the current working tree and advances HEAD.
///
/// # Errors
/// Returns an error if the archive tool fails or the store cannot be
/// written.
pub fn execute(paths: &RitPaths, msg: &str) -> Result<Commit> {
    let mut store = Store::new(paths.clone());
    let commit = snapshot::create_commit(
        &mut store,
        utils::current_timestamp(),
        msg,
        output::is_verbose(),
    )?;
    output::success(&format!(
        "Created commit {}: {}",
        formatters::short_id(&commit.commit_id).yellow(),
        commit.msg
    ));
    Ok(commit)
}
