//! Output formatting and verbosity control for the rit CLI.
//!
//! Routine messages go to stderr with dimmed-to-bold coloring and respect the
//! global verbosity; warnings and errors always print.

use colored::Colorize;
use std::sync::atomic::{AtomicI8, Ordering};

/// Global verbosity: negative is quiet, zero is normal, positive is verbose.
static VERBOSITY: AtomicI8 = AtomicI8::new(0);

/// Sets the global verbosity level (`-v` minus `-q` counts).
pub fn set_verbosity(level: i8) {
    VERBOSITY.store(level, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn verbosity() -> i8 {
    VERBOSITY.load(Ordering::Relaxed)
}

/// Whether verbose-only output is enabled.
pub fn is_verbose() -> bool {
    verbosity() > 0
}

/// Prints an informational message (suppressed in quiet mode).
pub fn info(message: &str) {
    if verbosity() >= 0 {
        eprintln!("{message}");
    }
}

/// Prints a success message in green (suppressed in quiet mode).
pub fn success(message: &str) {
    if verbosity() >= 0 {
        eprintln!("{}", message.green());
    }
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
