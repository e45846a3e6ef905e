use crate::errors::Result;
use crate::graph;
use crate::output;
use crate::paths::RitPaths;
use crate::store::Store;
use crate::utils::formatters;

/// Removes every commit unreachable from any branch or HEAD.
///
/// # Errors
/// Returns an error on store failure.
pub fn execute(paths: &RitPaths) -> Result<Vec<String>> {
    let mut store = Store::new(paths.clone());
    let removed = graph::prune_unreachable(&mut store)?;
    if removed.is_empty() {
        output::info("Nothing to prune");
    } else {
        for commit_id in &removed {
            output::info(&format!("Pruned {}", formatters::short_id(commit_id)));
        }
        output::success(&format!("Removed {} commits", removed.len()));
    }
    Ok(removed)
}
