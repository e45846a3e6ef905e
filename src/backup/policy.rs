//! Naming scheme for the rotation policy.
//!
//! Periodic snapshots live on branches named by a time bucket: the UTC clock
//! decomposes into level labels (coarsest first), full level names chain the
//! labels with `_`, and each level's branch is
//! `periodic__lvl_<level>__<full_name>`. Ring branches use a slot index
//! instead of a time bucket.

use chrono::{DateTime, Timelike, Utc};

/// Prefix of every periodic-level branch.
pub const PERIODIC_PREFIX: &str = "periodic";
/// Prefix of the restore-point ring branches.
pub const RESTORE_PREFIX: &str = "restore";
/// Prefix of the quick-backup ring branches.
pub const QUICK_PREFIX: &str = "quick";
/// Prefix of manual backup branches; these are never pruned.
pub const MANUAL_PREFIX: &str = "manual";

/// Which edge of a restore point a ring branch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingSide {
    /// The commit taken just before the restore.
    Before,
    /// The commit the restore landed on.
    After,
}

impl RingSide {
    fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Decomposes a timestamp into level labels, coarsest first:
/// year-month, day, hour, quarter-hour.
#[must_use]
pub fn level_labels(now: DateTime<Utc>) -> Vec<String> {
    let quarter = now.minute() - now.minute() % 15;
    vec![
        now.format("%Y_%m").to_string(),
        now.format("%d").to_string(),
        now.format("%H").to_string(),
        format!("{quarter:02}"),
    ]
}

/// Branch names for every level at `now`, coarsest first.
#[must_use]
pub fn level_branch_names(now: DateTime<Utc>) -> Vec<String> {
    let mut full_name = String::new();
    level_labels(now)
        .iter()
        .enumerate()
        .map(|(level, label)| {
            if full_name.is_empty() {
                full_name.clone_from(label);
            } else {
                full_name = format!("{full_name}_{label}");
            }
            format!("{PERIODIC_PREFIX}__lvl_{level}__{full_name}")
        })
        .collect()
}

/// The branch-name prefix shared by every bucket of one periodic level.
#[must_use]
pub fn periodic_level_prefix(level: usize) -> String {
    format!("{PERIODIC_PREFIX}__lvl_{level}__")
}

/// The restore-ring branch name for a slot.
#[must_use]
pub fn restore_slot_name(slot: usize, side: RingSide) -> String {
    format!("{RESTORE_PREFIX}__idx_{slot}__{}", side.as_str())
}

/// The quick-ring branch name for a slot.
#[must_use]
pub fn quick_slot_name(slot: usize) -> String {
    format!("{QUICK_PREFIX}__idx_{slot}__global")
}

/// The branch name of a manual backup.
#[must_use]
pub fn manual_branch_name(name: &str) -> String {
    format!("{MANUAL_PREFIX}__{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn labels_decompose_utc_time() {
        let when = Utc.with_ymd_and_hms(2022, 5, 2, 12, 17, 42).unwrap();
        assert_eq!(level_labels(when), vec!["2022_05", "02", "12", "15"]);
    }

    #[test]
    fn quarter_hour_rounds_down() {
        let when = Utc.with_ymd_and_hms(2022, 5, 2, 12, 59, 0).unwrap();
        assert_eq!(level_labels(when).pop().unwrap(), "45");
        let when = Utc.with_ymd_and_hms(2022, 5, 2, 12, 0, 1).unwrap();
        assert_eq!(level_labels(when).pop().unwrap(), "00");
    }

    #[test]
    fn branch_names_chain_full_level_names() {
        let when = Utc.with_ymd_and_hms(2022, 5, 2, 12, 17, 0).unwrap();
        assert_eq!(
            level_branch_names(when),
            vec![
                "periodic__lvl_0__2022_05",
                "periodic__lvl_1__2022_05_02",
                "periodic__lvl_2__2022_05_02_12",
                "periodic__lvl_3__2022_05_02_12_15",
            ]
        );
    }

    #[test]
    fn ring_and_manual_names() {
        assert_eq!(restore_slot_name(1, RingSide::Before), "restore__idx_1__before");
        assert_eq!(restore_slot_name(3, RingSide::After), "restore__idx_3__after");
        assert_eq!(quick_slot_name(2), "quick__idx_2__global");
        assert_eq!(manual_branch_name("pre_upgrade"), "manual__pre_upgrade");
    }
}
