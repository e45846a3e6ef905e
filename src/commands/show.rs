use crate::errors::{Result, RitError};
use crate::graph;
use crate::output;
use crate::paths::RitPaths;
use crate::snapshot;
use crate::store::Store;
use crate::utils::formatters;
use crate::HEAD_REF;
use colored::Colorize;

/// Prints the member paths of a commit's archive.
///
/// # Errors
/// Fails with [`RitError::UnresolvableRef`] when the ref matches nothing or
/// HEAD has no commit to show, and surfaces archive-tool failures.
pub fn execute(paths: &RitPaths, reference: Option<&str>) -> Result<Vec<String>> {
    let store = Store::new(paths.clone());

    let res = graph::resolve_ref(&store, reference)?;
    let Some(commit) = res.commit else {
        return Err(RitError::UnresolvableRef(
            reference.unwrap_or(HEAD_REF).to_string(),
        ));
    };

    output::info(&format!(
        "Contents of {} {}",
        formatters::short_id(&commit.commit_id).yellow(),
        commit.msg
    ));
    let entries = snapshot::list_commit_archive(&store, &commit.commit_id)?;
    for entry in &entries {
        println!("{entry}");
    }
    Ok(entries)
}
