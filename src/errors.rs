use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rit operations.
///
/// Every failure surfaces through one of these variants; the CLI prints the
/// display form as a single line and exits nonzero.
#[derive(Error, Debug)]
pub enum RitError {
    /// No `.rit` directory in the starting directory or any parent.
    #[error("not a rit repository (searched {start} and its parents)", start = .0.display())]
    NotARepository(PathBuf),

    /// `init` ran inside an already-initialized repository.
    #[error("rit directory already exists: {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// A reference did not name a branch, a commit, or an unambiguous prefix.
    #[error("unable to resolve ref: {0}")]
    UnresolvableRef(String),

    /// A commit-id prefix matched more than one commit.
    #[error("ambiguous reference {reference}: matches {}", .candidates.join(", "))]
    AmbiguousReference {
        /// The prefix the user supplied.
        reference: String,
        /// Every full commit id sharing that prefix.
        candidates: Vec<String>,
    },

    /// `reset` was asked to reset HEAD onto itself.
    #[error("refusing to reset to the head ref")]
    ResetToHead,

    /// Branch name failed validation (empty, non-word, or the HEAD sentinel).
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    /// Branch creation without `--force` over an existing branch.
    #[error("branch already exists: {0} (use -f to overwrite)")]
    BranchExists(String),

    /// Branch deletion or lookup of a branch that does not exist.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Branch creation with a name equal to a stored commit id.
    #[error("not creating a branch with the same name as a commit id: {0}")]
    NameShadowsCommit(String),

    /// Checkout would overwrite uncommitted working-tree changes.
    #[error("uncommitted changes in the working tree (use -f to discard them)")]
    DirtyWorkingTree,

    /// The archive tool exited nonzero.
    #[error("archive tool failed with exit code {0}")]
    ArchiveToolFailure(i32),

    /// The archive tool binary is absent or not GNU tar.
    #[error("archive tool unavailable: {0}")]
    ArchiveToolMissing(String),

    /// A commit record with the same id but different content already exists.
    #[error("hash collision on commit {0}")]
    HashCollision(String),

    /// An operation received a contradictory or incomplete argument set.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A record file exists but does not decode.
    #[error("corrupt record {}: {source}", .path.display())]
    CorruptRecord {
        /// Path of the unreadable record.
        path: PathBuf,
        /// The decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file exists but does not parse.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Underlying filesystem or subprocess I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rit operations.
pub type Result<T> = std::result::Result<T, RitError>;
