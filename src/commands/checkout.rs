use crate::errors::{Result, RitError};
use crate::graph::{self, ResolvedRef};
use crate::output;
use crate::paths::RitPaths;
use crate::snapshot;
use crate::store::{Head, Store};
use crate::utils::formatters;
use colored::Colorize;

/// Switches HEAD to a reference and restores the working tree to it.
///
/// With `orphan`, the ref-or-name argument is the name of a new, not yet
/// existing branch: HEAD attaches to it, the working tree is retained, and
/// neither a branch record nor a commit is created until the next commit.
///
/// # Errors
/// Fails with [`RitError::DirtyWorkingTree`] when switching away from
/// uncommitted changes without `force`, [`RitError::InvalidArguments`] for
/// contradictory flags or an attempt to check out the HEAD sentinel, and
/// [`RitError::UnresolvableRef`] when the reference matches nothing.
pub fn execute(
    paths: &RitPaths,
    ref_or_name: Option<&str>,
    orphan: bool,
    force: bool,
) -> Result<ResolvedRef> {
    let mut store = Store::new(paths.clone());

    if orphan {
        if force {
            return Err(RitError::InvalidArguments(
                "--force does not apply to an orphan checkout".to_string(),
            ));
        }
        let name = ref_or_name.ok_or_else(|| {
            RitError::InvalidArguments("an orphan checkout needs a branch name".to_string())
        })?;
        graph::validate_branch_name(name)?;
        if store.is_branch(name)? {
            return Err(RitError::BranchExists(name.to_string()));
        }
        store.set_head(Head::Branch(name.to_string()))?;
        output::success(&format!("Switched to a new orphan branch '{name}'"));
        return graph::resolve_ref(&store, None);
    }

    let reference = ref_or_name.ok_or_else(|| {
        RitError::InvalidArguments("a ref to checkout is required".to_string())
    })?;
    let res = graph::resolve_ref(&store, Some(reference))?;
    if res.head.is_some() {
        return Err(RitError::InvalidArguments(
            "cannot checkout the head ref".to_string(),
        ));
    }
    let Some(commit) = &res.commit else {
        return Err(RitError::UnresolvableRef(reference.to_string()));
    };

    let prior = store.head_commit_id()?;
    if prior.as_deref() != Some(commit.commit_id.as_str()) {
        if !force && snapshot::working_tree_status(&store, false)?.is_dirty() {
            return Err(RitError::DirtyWorkingTree);
        }
        snapshot::restore_working_tree(&store, &commit.commit_id)?;
    }

    match &res.branch {
        Some(branch) => {
            store.set_head(Head::Branch(branch.name.clone()))?;
            output::success(&format!("Switched to branch '{}'", branch.name));
        }
        None => {
            store.set_head(Head::Commit(commit.commit_id.clone()))?;
            output::success(&format!(
                "HEAD is now detached at {}",
                formatters::short_id(&commit.commit_id).yellow()
            ));
        }
    }
    Ok(res)
}
