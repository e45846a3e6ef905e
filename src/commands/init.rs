use crate::errors::Result;
use crate::output;
use crate::paths::RitPaths;
use std::path::Path;

/// Initializes a new repository at `root`.
///
/// # Errors
/// Fails with [`crate::errors::RitError::AlreadyInitialized`] when the
/// administrative subtree already exists.
pub fn execute(root: &Path) -> Result<RitPaths> {
    let paths = RitPaths::init(root)?;
    output::success(&format!(
        "Initialized empty rit repository: {}",
        paths.rit_dir.display()
    ));
    Ok(paths)
}
