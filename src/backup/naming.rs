//! Backup family naming
//!
//! For a reference `<dir>/<stem><suffix>`:
//!
//! ```text
//! <dir>/
//! ├── <stem><suffix>                          -> .<plural>/<stem>-<ts><suffix>
//! └── .<plural>/
//!     ├── <stem>-20240101_0930<suffix>
//!     ├── <stem>-20240101_0930_1<suffix>      # same-minute collision
//!     └── <stem>-20240315_1412<suffix>
//! ```
//!
//! `<plural>` is the stem with `es` appended when it ends in `status`, `s`
//! otherwise. Timestamps are local time at minute resolution.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;

use super::errors::{BackupError, BackupResult};

/// Timestamp format of snapshot names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

/// One snapshot of a backup family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: PathBuf,
    /// Minute the snapshot was taken
    pub timestamp: NaiveDateTime,
    /// Collision counter within that minute (0 for the first)
    pub counter: u32,
}

/// Stem and suffix (extension with its dot) of a reference path.
pub(crate) fn split_reference(reference: &Path) -> (String, String) {
    let stem = reference
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = reference
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

/// Default backup directory name: the pluralized stem, dot-prefixed.
pub fn default_backup_dir_name(reference: &Path) -> String {
    let (stem, _) = split_reference(reference);
    if stem.ends_with("status") {
        format!(".{}es", stem)
    } else {
        format!(".{}s", stem)
    }
}

/// Backup directory of a reference: `name` if given, else the default,
/// placed next to the reference.
pub fn backup_dir_for(reference: &Path, name: Option<&str>) -> PathBuf {
    let name = match name {
        Some(name) => name.to_string(),
        None => default_backup_dir_name(reference),
    };
    match reference.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// File name of a snapshot.
pub(crate) fn snapshot_file_name(reference: &Path, timestamp: &NaiveDateTime, counter: u32) -> String {
    let (stem, suffix) = split_reference(reference);
    let timestamp = timestamp.format(TIMESTAMP_FORMAT);
    if counter == 0 {
        format!("{}-{}{}", stem, timestamp, suffix)
    } else {
        format!("{}-{}_{}{}", stem, timestamp, counter, suffix)
    }
}

/// First snapshot path for `timestamp` that does not exist yet.
pub(crate) fn next_free_snapshot(backup_dir: &Path, reference: &Path, timestamp: &NaiveDateTime) -> PathBuf {
    let mut counter = 0;
    loop {
        let candidate = backup_dir.join(snapshot_file_name(reference, timestamp, counter));
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        counter += 1;
    }
}

fn snapshot_pattern(reference: &Path) -> Option<Regex> {
    let (stem, suffix) = split_reference(reference);
    let pattern = format!(
        r"^{}-(\d{{8}}_\d{{4}})(?:_(\d+))?{}$",
        regex::escape(&stem),
        regex::escape(&suffix)
    );
    Regex::new(&pattern).ok()
}

/// Parses a snapshot file name belonging to `reference`'s family.
pub fn parse_snapshot_name(reference: &Path, file_name: &str) -> Option<(NaiveDateTime, u32)> {
    let pattern = snapshot_pattern(reference)?;
    parse_with(&pattern, file_name)
}

fn parse_with(pattern: &Regex, file_name: &str) -> Option<(NaiveDateTime, u32)> {
    let captures = pattern.captures(file_name)?;
    let timestamp = NaiveDateTime::parse_from_str(captures.get(1)?.as_str(), TIMESTAMP_FORMAT).ok()?;
    let counter = match captures.get(2) {
        Some(counter) => counter.as_str().parse().ok()?,
        None => 0,
    };
    Some((timestamp, counter))
}

/// Snapshots of a backup family, oldest first.
///
/// A missing backup directory has no snapshots. Files that do not follow the
/// family's naming are ignored.
pub fn list_snapshots(reference: &Path, name: Option<&str>) -> BackupResult<Vec<Snapshot>> {
    let backup_dir = backup_dir_for(reference, name);
    if !backup_dir.is_dir() {
        return Ok(Vec::new());
    }

    let Some(pattern) = snapshot_pattern(reference) else {
        return Ok(Vec::new());
    };

    let entries = fs::read_dir(&backup_dir).map_err(|e| BackupError::io(&backup_dir, e))?;

    let mut snapshots = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BackupError::io(&backup_dir, e))?;
        let file_name = entry.file_name();
        let Some((timestamp, counter)) = parse_with(&pattern, &file_name.to_string_lossy()) else {
            continue;
        };
        snapshots.push(Snapshot {
            path: entry.path(),
            timestamp,
            counter,
        });
    }

    snapshots.sort_by(|a, b| (a.timestamp, a.counter).cmp(&(b.timestamp, b.counter)));
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_pluralization() {
        assert_eq!(default_backup_dir_name(Path::new("test.tsv")), ".tests");
        assert_eq!(default_backup_dir_name(Path::new("test2.tsv")), ".test2s");
        assert_eq!(default_backup_dir_name(Path::new("status.tsv")), ".statuses");
        assert_eq!(
            default_backup_dir_name(Path::new("/d/processing_status.tsv")),
            ".processing_statuses"
        );
        assert_eq!(default_backup_dir_name(Path::new("manifest.tsv")), ".manifests");
    }

    #[test]
    fn test_backup_dir_next_to_reference() {
        assert_eq!(
            backup_dir_for(Path::new("/data/manifest.tsv"), None),
            PathBuf::from("/data/.manifests")
        );
        assert_eq!(
            backup_dir_for(Path::new("/data/manifest.tsv"), Some(".history")),
            PathBuf::from("/data/.history")
        );
    }

    #[test]
    fn test_snapshot_file_name() {
        let reference = Path::new("/data/manifest.tsv");
        assert_eq!(snapshot_file_name(reference, &at(9, 5), 0), "manifest-20240315_0905.tsv");
        assert_eq!(snapshot_file_name(reference, &at(9, 5), 2), "manifest-20240315_0905_2.tsv");
    }

    #[test]
    fn test_parse_snapshot_name() {
        let reference = Path::new("/data/manifest.tsv");
        assert_eq!(
            parse_snapshot_name(reference, "manifest-20240315_0905.tsv"),
            Some((at(9, 5), 0))
        );
        assert_eq!(
            parse_snapshot_name(reference, "manifest-20240315_0905_3.tsv"),
            Some((at(9, 5), 3))
        );
        assert_eq!(parse_snapshot_name(reference, "other-20240315_0905.tsv"), None);
        assert_eq!(parse_snapshot_name(reference, "manifest-2024.tsv"), None);
        assert_eq!(parse_snapshot_name(reference, "manifest-20240315_0905.csv"), None);
    }

    #[test]
    fn test_next_free_snapshot_appends_counter() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("manifest.tsv");

        let first = next_free_snapshot(dir.path(), &reference, &at(12, 0));
        assert!(first.ends_with("manifest-20240315_1200.tsv"));
        fs::write(&first, "x").unwrap();

        let second = next_free_snapshot(dir.path(), &reference, &at(12, 0));
        assert!(second.ends_with("manifest-20240315_1200_1.tsv"));
    }

    #[test]
    fn test_list_snapshots_sorted_oldest_first() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("manifest.tsv");
        let backups = backup_dir_for(&reference, None);
        fs::create_dir(&backups).unwrap();

        for name in [
            "manifest-20240315_1200_1.tsv",
            "manifest-20240315_0905.tsv",
            "manifest-20240315_1200.tsv",
            "notes.txt",
        ] {
            fs::write(backups.join(name), "").unwrap();
        }

        let snapshots = list_snapshots(&reference, None).unwrap();
        let order: Vec<(NaiveDateTime, u32)> =
            snapshots.iter().map(|s| (s.timestamp, s.counter)).collect();
        assert_eq!(order, vec![(at(9, 5), 0), (at(12, 0), 0), (at(12, 0), 1)]);
    }

    #[test]
    fn test_list_snapshots_missing_dir() {
        let dir = TempDir::new().unwrap();
        let snapshots = list_snapshots(&dir.path().join("manifest.tsv"), None).unwrap();
        assert!(snapshots.is_empty());
    }
}
