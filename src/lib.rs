#![warn(missing_docs)]

//! # Rit - Incremental Snapshot Version Control
//!
//! Rit is a single-user, local version control system that records full and
//! incremental archives of a working directory and exposes them as a commit
//! graph with branches, a movable HEAD, and a tiered backup rotation layer.
//!
//! Every commit is a compressed GNU tar archive of the working tree plus the
//! tar tracking index that makes the *next* archive incremental. The pair is
//! addressed by a SHA-1 digest over the commit metadata and both files, so a
//! commit id is a pure function of its content.
//!
//! ## Architecture
//!
//! - [`paths`]: repository layout and parent-walk discovery
//! - [`store`]: the object store (commits, branches, HEAD, archive objects)
//! - [`graph`]: reference resolution and ancestry traversal
//! - [`archive`]: the external archive tool driver (GNU tar contract)
//! - [`snapshot`]: the snapshot protocol (commit, status, restore, show)
//! - [`backup`]: the rotation policy (periodic levels, restore/quick rings)
//! - [`commands`]: one module per CLI operation
//!
//! ## Example
//!
//! ```no_run
//! use rit::paths::RitPaths;
//!
//! # fn main() -> rit::errors::Result<()> {
//! let paths = RitPaths::init(std::env::current_dir()?)?;
//! let commit = rit::commands::commit::execute(&paths, "first snapshot")?;
//! println!("created {}", commit.commit_id);
//! # Ok(())
//! # }
//! ```

/// External archive tool driver (GNU tar contract).
pub mod archive;

/// Tiered backup rotation: periodic levels, restore ring, quick ring.
pub mod backup;

/// Command implementations (init, commit, checkout, ...).
pub mod commands;

/// Configuration parsing for the rotation policy.
pub mod config;

/// Error taxonomy and the crate-wide `Result` alias.
pub mod errors;

/// Reference resolution and ancestry traversal.
pub mod graph;

/// Advisory locking for the snapshot work slot.
pub mod lock;

/// Output formatting and verbosity control.
pub mod output;

/// Repository layout and discovery.
pub mod paths;

/// The snapshot protocol: commit creation, status, working-tree restore.
pub mod snapshot;

/// The object store: records, read cache, read-only view.
pub mod store;

/// Utility functions and helpers.
pub mod utils;

/// Current version of the rit binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the hidden administrative subdirectory.
pub const RIT_DIR_NAME: &str = ".rit";

/// Branch an absent HEAD record implicitly points at.
pub const DEFAULT_BRANCH: &str = "main";

/// The HEAD sentinel: a reserved ref name and the HEAD record's filename.
pub const HEAD_REF: &str = "HEAD";

/// Length of a full commit id in hex characters (SHA-1).
pub const FULL_HASH_LEN: usize = 40;

/// Short-prefix length used for display and prefix indexing.
pub const SHORT_HASH_LEN: usize = 7;

/// File extension of a commit's compressed archive under `backups/`.
pub const ARCHIVE_EXT: &str = "archive";

/// File extension of a commit's tracking index under `backups/`.
pub const INDEX_EXT: &str = "index";
