//! Configuration for the backup rotation policy.
//!
//! Stored as TOML at `.rit/config.toml`. A missing file yields the defaults;
//! a present but malformed file is an error rather than a silent fallback.

use crate::errors::{Result, RitError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SECOND: f64 = 1.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const YEAR: f64 = 365.25 * DAY;
const MONTH: f64 = YEAR / 12.0;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Rotation policy settings.
    #[serde(default)]
    pub backup: BackupConfig,
}

/// Rotation policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Maximum age in seconds for each periodic level, coarsest first.
    /// Zero means the level never expires. Must match the level count.
    #[serde(default = "default_level_max_ages")]
    pub level_max_ages: Vec<f64>,

    /// Number of slots in the restore-point ring.
    #[serde(default = "default_restore_slots")]
    pub restore_slots: usize,

    /// Number of slots in the quick-backup ring.
    #[serde(default = "default_quick_slots")]
    pub quick_slots: usize,
}

fn default_level_max_ages() -> Vec<f64> {
    // Full backups are kept forever; finer levels age out.
    vec![0.0, YEAR, 3.0 * MONTH, MONTH]
}

const fn default_restore_slots() -> usize {
    5
}

const fn default_quick_slots() -> usize {
    10
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            level_max_ages: default_level_max_ages(),
            restore_slots: default_restore_slots(),
            quick_slots: default_quick_slots(),
        }
    }
}

impl Config {
    /// Loads the configuration, falling back to defaults when absent.
    ///
    /// # Errors
    /// Returns [`RitError::Config`] when the file exists but does not parse,
    /// or an I/O error when it cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RitError::Config(e.to_string()))
    }

    /// Writes the configuration to `path`.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| RitError::Config(e.to_string()))?;
        crate::utils::atomic_write(path, text.as_bytes())
    }
}
