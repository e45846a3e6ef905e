use crate::errors::{Result, RitError};
use crate::graph;
use crate::output;
use crate::paths::RitPaths;
use crate::store::{Branch, Head, Store};
use crate::utils::formatters;
use crate::HEAD_REF;
use colored::Colorize;

/// The branch operation: list, create/move, or delete.
///
/// With no name, lists branches (`force`/`ref` are rejected). With a name
/// and no `delete`, creates the branch at the resolved reference (HEAD by
/// default), requiring `force` to move an existing branch. With `delete`,
/// removes the named branch (`force`/`ref` are rejected).
///
/// # Errors
/// Fails with [`RitError::InvalidArguments`] for contradictory flags or an
/// attempt to move or delete the branch HEAD is attached to,
/// [`RitError::BranchExists`], [`RitError::BranchNotFound`], or
/// [`RitError::UnresolvableRef`].
pub fn execute(
    paths: &RitPaths,
    name: Option<&str>,
    reference: Option<&str>,
    force: bool,
    delete: bool,
) -> Result<()> {
    let mut store = Store::new(paths.clone());

    if let Some(name) = name {
        graph::validate_branch_name(name)?;
        if let Head::Branch(head_branch) = store.head()?
            && head_branch == name
        {
            return Err(RitError::InvalidArguments(format!(
                "cannot modify branch '{name}' while HEAD is attached to it"
            )));
        }
    }

    if delete {
        if force {
            return Err(RitError::InvalidArguments(
                "branches cannot be force deleted".to_string(),
            ));
        }
        let Some(name) = name else {
            return Err(RitError::InvalidArguments(
                "a branch name is required to delete".to_string(),
            ));
        };
        if reference.is_some() {
            return Err(RitError::InvalidArguments(
                "a ref does not apply when deleting a branch".to_string(),
            ));
        }
        if !store.delete_branch(name)? {
            return Err(RitError::BranchNotFound(name.to_string()));
        }
        output::success(&format!("Deleted branch '{name}'"));
        return Ok(());
    }

    let Some(name) = name else {
        if force {
            return Err(RitError::InvalidArguments(
                "--force does not apply when listing branches".to_string(),
            ));
        }
        if reference.is_some() {
            return Err(RitError::InvalidArguments(
                "a ref does not apply when listing branches".to_string(),
            ));
        }
        return list(&store);
    };

    if store.is_branch(name)? && !force {
        return Err(RitError::BranchExists(name.to_string()));
    }
    let res = graph::resolve_ref(&store, reference)?;
    let Some(commit) = res.commit else {
        return Err(RitError::UnresolvableRef(
            reference.unwrap_or(HEAD_REF).to_string(),
        ));
    };
    store.set_branch(Branch {
        name: name.to_string(),
        commit_id: commit.commit_id.clone(),
        info: String::new(),
    })?;
    output::success(&format!(
        "Created branch {} at {}",
        name.green(),
        formatters::short_id(&commit.commit_id).yellow()
    ));
    Ok(())
}

/// Prints every branch, marking the one HEAD is attached to.
fn list(store: &Store) -> Result<()> {
    let head = store.head()?;
    for name in store.branch_names()? {
        let current = matches!(&head, Head::Branch(attached) if attached == &name);
        let marker = if current { "*" } else { " " };
        let branch = store
            .branch(&name)?
            .ok_or_else(|| RitError::BranchNotFound(name.clone()))?;
        let commit = store.commit_ensured(&branch.commit_id)?;
        println!(
            "{marker} {}\t{} {}",
            name.green(),
            formatters::short_id(&branch.commit_id).yellow(),
            commit.msg
        );
    }
    Ok(())
}
