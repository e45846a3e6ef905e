//! Driver for the external archive tool (GNU tar).
//!
//! The tool contract: given a tracking-index path, an archive output path,
//! a working root, and an exclusion, it reads the index if non-empty, writes
//! a new or updated archive, rewrites the index in place, and exits zero.
//! GNU tar's `--listed-incremental` (`-g`) mode satisfies this; extraction
//! with `-x -g` replays deletions between snapshots.

use crate::errors::{Result, RitError};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// The null device used for dry-run archives and extraction indexes.
pub const NULL_SINK: &str = "/dev/null";

/// How `create` runs the tool and what it does with the tool's stdout.
#[derive(Debug, Clone, Copy)]
pub struct CreateOptions {
    /// Compress the archive.
    pub compress: bool,
    /// Pipe the tool's entry listing back instead of inheriting stdout.
    pub capture: bool,
    /// While capturing, also forward each line to our stdout as it arrives.
    pub echo: bool,
}

/// A located, version-checked archive tool binary.
pub struct ArchiveTool {
    program: PathBuf,
}

impl ArchiveTool {
    /// Locates the archive tool on PATH and verifies it is GNU tar.
    ///
    /// # Errors
    /// Fails with [`RitError::ArchiveToolMissing`] when the binary is absent
    /// or is not a GNU tar.
    pub fn locate() -> Result<Self> {
        let program =
            which::which("tar").map_err(|e| RitError::ArchiveToolMissing(e.to_string()))?;
        let tool = Self { program };
        tool.check_version()?;
        Ok(tool)
    }

    fn check_version(&self) -> Result<()> {
        let output = Command::new(&self.program).arg("--version").output()?;
        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        debug!(version = %version, "archive tool version");
        if !output.status.success() || !version.contains("GNU tar") {
            return Err(RitError::ArchiveToolMissing(format!(
                "GNU tar is required, found: {version}"
            )));
        }
        Ok(())
    }

    fn wait_checked(status: std::process::ExitStatus) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            Err(RitError::ArchiveToolFailure(status.code().unwrap_or(-1)))
        }
    }

    /// Creates or updates an incremental archive of `root`.
    ///
    /// The tracking index at `index` is read when non-empty and rewritten in
    /// place; the archive lands at `archive` (which may be the null sink for
    /// a dry run). When capturing, returns the changed-entry lines the tool
    /// reported, with the bare `./` line dropped.
    ///
    /// # Errors
    /// Fails with [`RitError::ArchiveToolFailure`] on a nonzero exit.
    pub fn create(
        &self,
        root: &Path,
        index: &Path,
        archive: &Path,
        exclude: &str,
        options: CreateOptions,
    ) -> Result<Option<Vec<String>>> {
        let mut opts = String::from("-c");
        if options.capture {
            opts.push('v');
        }
        if options.compress {
            opts.push('z');
        }
        opts.push('g');

        let mut command = Command::new(&self.program);
        command
            .arg(&opts)
            .arg(index)
            .arg(format!("--exclude={exclude}"))
            .arg("-f")
            .arg(archive)
            .arg(".")
            .current_dir(root);
        debug!(?command, "running archive tool");

        if !options.capture {
            let status = command.status()?;
            Self::wait_checked(status)?;
            return Ok(None);
        }

        let mut child = command.stdout(Stdio::piped()).spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RitError::ArchiveToolMissing("archive tool stdout".to_string()))?;
        let mut lines = Vec::new();
        // Drain to EOF before waiting so the child never blocks on a full pipe.
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            if line == "./" {
                continue;
            }
            if options.echo {
                let mut out = std::io::stdout().lock();
                let _ = writeln!(out, "{line}");
            }
            lines.push(line);
        }
        let status = child.wait()?;
        Self::wait_checked(status)?;
        Ok(Some(lines))
    }

    /// Extracts an archive over `root`, replaying deletions.
    ///
    /// The exclusion protects the administrative subtree from the
    /// incremental purge pass.
    ///
    /// # Errors
    /// Fails with [`RitError::ArchiveToolFailure`] on a nonzero exit.
    pub fn extract(&self, root: &Path, archive: &Path, exclude: &str) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("-x")
            .arg("-g")
            .arg(NULL_SINK)
            .arg(format!("--exclude={exclude}"))
            .arg("-f")
            .arg(archive)
            .current_dir(root);
        debug!(?command, "extracting archive");
        let status = command.status()?;
        Self::wait_checked(status)
    }

    /// Lists the member paths of an archive.
    ///
    /// # Errors
    /// Fails with [`RitError::ArchiveToolFailure`] on a nonzero exit.
    pub fn list(&self, archive: &Path) -> Result<Vec<String>> {
        let mut child = Command::new(&self.program)
            .arg("-tf")
            .arg(archive)
            .stdout(Stdio::piped())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RitError::ArchiveToolMissing("archive tool stdout".to_string()))?;
        let mut entries = Vec::new();
        for line in BufReader::new(stdout).lines() {
            entries.push(line?);
        }
        let status = child.wait()?;
        Self::wait_checked(status)?;
        Ok(entries)
    }
}
