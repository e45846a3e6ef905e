use crate::errors::Result;
use crate::paths::RitPaths;
use crate::store::{Head, Store};
use crate::utils::formatters;
use colored::Colorize;

/// Prints a read-only snapshot of the object store.
///
/// # Errors
/// Returns an error on store failure.
pub fn execute(paths: &RitPaths) -> Result<()> {
    let store = Store::new(paths.clone());
    let view = store.view();

    match view.head()? {
        Head::Branch(name) => println!("HEAD: attached to {}", name.green()),
        Head::Commit(commit_id) => println!(
            "HEAD: detached at {}",
            formatters::short_id(&commit_id).yellow()
        ),
    }
    match view.head_commit_id()? {
        Some(commit_id) => println!("HEAD commit: {commit_id}"),
        None => println!("HEAD commit: none"),
    }

    let names = view.branch_names()?;
    println!("branches: {}", names.len());
    for name in names {
        if let Some(branch) = view.branch(&name)? {
            println!(
                "  {}\t{}",
                name.green(),
                formatters::short_id(&branch.commit_id).yellow()
            );
        }
    }
    println!("commits: {}", view.commit_ids()?.len());
    Ok(())
}
