use crate::errors::{Result, RitError};
use crate::graph::{self, ResolvedRef};
use crate::output;
use crate::paths::RitPaths;
use crate::snapshot;
use crate::store::{Branch, Head, Store};
use crate::utils::formatters;
use crate::HEAD_REF;
use colored::Colorize;

/// Moves HEAD (or its attached branch) to a reference.
///
/// In soft mode the working tree is untouched; with `hard` the tree is
/// restored to the target commit.
///
/// # Errors
/// Fails with [`RitError::ResetToHead`] when asked to reset to the HEAD
/// sentinel, and [`RitError::UnresolvableRef`] when the reference does not
/// resolve to a commit.
pub fn execute(paths: &RitPaths, reference: &str, hard: bool) -> Result<ResolvedRef> {
    let mut store = Store::new(paths.clone());

    if reference == HEAD_REF {
        return Err(RitError::ResetToHead);
    }
    let res = graph::resolve_ref(&store, Some(reference))?;
    let Some(commit) = &res.commit else {
        return Err(RitError::UnresolvableRef(reference.to_string()));
    };

    match store.head()? {
        // An attached HEAD moves the branch, materializing an orphan branch.
        Head::Branch(name) => store.set_branch(Branch {
            name,
            commit_id: commit.commit_id.clone(),
            info: String::new(),
        })?,
        Head::Commit(_) => store.set_head(Head::Commit(commit.commit_id.clone()))?,
    }

    if hard {
        snapshot::restore_working_tree(&store, &commit.commit_id)?;
    }
    output::success(&format!(
        "HEAD is now at {} {}",
        formatters::short_id(&commit.commit_id).yellow(),
        commit.msg
    ));
    Ok(res)
}
