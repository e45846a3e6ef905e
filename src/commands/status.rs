use crate::errors::Result;
use crate::output;
use crate::paths::RitPaths;
use crate::snapshot::{self, TreeStatus};
use crate::store::Store;

/// Reports whether the working tree has changed since the HEAD snapshot.
///
/// Implemented as a dry-run snapshot against HEAD's tracking index with the
/// archive discarded. In verbose mode the changed entries stream to stdout
/// as the archive tool reports them.
///
/// # Errors
/// Surfaces archive-tool failures.
pub fn execute(paths: &RitPaths) -> Result<TreeStatus> {
    let store = Store::new(paths.clone());
    let status = snapshot::working_tree_status(&store, output::is_verbose())?;
    match &status {
        TreeStatus::Clean => output::success("Clean working directory!"),
        TreeStatus::Dirty(changed) => {
            output::info(&format!("{} entries changed since HEAD", changed.len()));
        }
    }
    Ok(status)
}
