//! Snapshot creation and reference repointing
//!
//! Save sequence:
//!
//! 1. Load the current reference; if it equals the new content, stop
//! 2. Pick the snapshot name (timestamp, then `_1`, `_2`, ... on collision)
//! 3. Create the backup directory
//! 4. Write the snapshot with `create_new`, then fsync the file
//! 5. fsync the backup directory
//! 6. Unlink the reference and symlink it to the snapshot
//!
//! Any failure in 3-5 removes the partial snapshot and leaves the reference
//! untouched. The unlink/symlink pair in 6 is not atomic: a crash between
//! the two leaves the reference missing until the next successful save.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use super::errors::{BackupError, BackupResult};
use super::naming::{backup_dir_for, next_free_snapshot, snapshot_file_name};
use crate::observability::{log_event, Event};
use crate::table::RecordSet;

/// Options for [`save_with_backup`]
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Backup directory name, next to the reference; derived from the
    /// reference stem when unset
    pub backup_dir_name: Option<String>,
    /// Link the reference with a path relative to its own directory
    pub use_relative_path: bool,
    /// Compute the outcome without touching the filesystem
    pub dry_run: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            backup_dir_name: None,
            use_relative_path: true,
            dry_run: false,
        }
    }
}

impl BackupOptions {
    pub fn with_backup_dir_name(mut self, name: impl Into<String>) -> Self {
        self.backup_dir_name = Some(name.into());
        self
    }

    pub fn with_relative_path(mut self, relative: bool) -> Self {
        self.use_relative_path = relative;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Saves `record_set` as a new snapshot and points `reference` at it.
///
/// Returns the absolute snapshot path, or `None` when the reference already
/// holds equal content. In dry-run mode the would-be snapshot path is
/// returned and nothing is written.
pub fn save_with_backup(
    record_set: &RecordSet,
    reference: &Path,
    options: &BackupOptions,
) -> BackupResult<Option<PathBuf>> {
    save_with_backup_at(record_set, reference, options, Local::now().naive_local())
}

/// [`save_with_backup`] with an explicit snapshot timestamp.
pub fn save_with_backup_at(
    record_set: &RecordSet,
    reference: &Path,
    options: &BackupOptions,
    timestamp: NaiveDateTime,
) -> BackupResult<Option<PathBuf>> {
    let reference = absolute(reference)?;
    let reference_display = reference.display().to_string();

    if reference_unchanged(record_set, &reference) {
        log_event(Event::SaveSkipped, &[("reference", reference_display.as_str())]);
        return Ok(None);
    }

    let backup_dir = backup_dir_for(&reference, options.backup_dir_name.as_deref());

    if options.dry_run {
        let snapshot = next_free_snapshot(&backup_dir, &reference, &timestamp);
        let snapshot_display = snapshot.display().to_string();
        log_event(
            Event::DryRun,
            &[
                ("reference", reference_display.as_str()),
                ("snapshot", snapshot_display.as_str()),
            ],
        );
        return Ok(Some(snapshot));
    }

    let content = record_set.to_tsv()?;

    fs::create_dir_all(&backup_dir).map_err(|source| BackupError::CreateDir {
        path: backup_dir.clone(),
        source,
    })?;

    let snapshot = write_snapshot(&backup_dir, &reference, &timestamp, &content)?;
    let snapshot_display = snapshot.display().to_string();
    let rows = record_set.len().to_string();
    log_event(
        Event::SnapshotWritten,
        &[
            ("rows", rows.as_str()),
            ("snapshot", snapshot_display.as_str()),
        ],
    );

    let target = repoint_reference(&reference, &snapshot, options.use_relative_path)?;
    let target_display = target.display().to_string();
    log_event(
        Event::ReferenceRepointed,
        &[
            ("reference", reference_display.as_str()),
            ("target", target_display.as_str()),
        ],
    );

    Ok(Some(snapshot))
}

/// The snapshot a reference currently points at.
///
/// `None` for a missing reference or a plain file.
pub fn resolve_reference(reference: &Path) -> BackupResult<Option<PathBuf>> {
    let metadata = match fs::symlink_metadata(reference) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BackupError::io(reference, e)),
    };
    if !metadata.file_type().is_symlink() {
        return Ok(None);
    }

    let target = fs::read_link(reference).map_err(|e| BackupError::io(reference, e))?;
    if target.is_absolute() {
        return Ok(Some(target));
    }
    let base = reference.parent().unwrap_or_else(|| Path::new(""));
    Ok(Some(base.join(target)))
}

/// Whether the reference exists, loads, and equals the new content.
fn reference_unchanged(record_set: &RecordSet, reference: &Path) -> bool {
    // `exists` follows the link, so a dangling reference counts as absent
    if !reference.exists() {
        return false;
    }

    match RecordSet::load(reference, Arc::clone(record_set.schema()), true) {
        Ok(current) => current.equals(record_set),
        Err(e) => {
            let path = reference.display().to_string();
            let error = e.to_string();
            log_event(
                Event::ReferenceUnreadable,
                &[
                    ("code", e.code()),
                    ("error", error.as_str()),
                    ("reference", path.as_str()),
                ],
            );
            false
        }
    }
}

/// Creates, writes and syncs a new snapshot file. Existing files are never
/// opened; a name taken concurrently moves on to the next counter.
fn write_snapshot(
    backup_dir: &Path,
    reference: &Path,
    timestamp: &NaiveDateTime,
    content: &[u8],
) -> BackupResult<PathBuf> {
    let mut counter = 0;
    let (path, mut file) = loop {
        let path = backup_dir.join(snapshot_file_name(reference, timestamp, counter));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(source) => return Err(BackupError::SnapshotWrite { path, source }),
        }
    };

    let written = file
        .write_all(content)
        .and_then(|_| file.sync_all())
        .and_then(|_| fsync_dir(backup_dir));

    if let Err(source) = written {
        drop(file);
        cleanup_partial_snapshot(&path);
        return Err(BackupError::SnapshotWrite { path, source });
    }

    Ok(path)
}

/// Replaces the reference (plain file or symlink) with a link to `snapshot`.
///
/// Returns the link target as written.
fn repoint_reference(reference: &Path, snapshot: &Path, relative: bool) -> BackupResult<PathBuf> {
    let target = if relative {
        let base = reference.parent().unwrap_or_else(|| Path::new(""));
        snapshot
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| snapshot.to_path_buf())
    } else {
        snapshot.to_path_buf()
    };

    let repoint_error = |source| BackupError::Repoint {
        path: reference.to_path_buf(),
        source,
    };

    if fs::symlink_metadata(reference).is_ok() {
        fs::remove_file(reference).map_err(repoint_error)?;
    }
    symlink(&target, reference).map_err(repoint_error)?;

    Ok(target)
}

/// fsync a directory so a new entry in it survives a crash.
fn fsync_dir(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        File::open(path)?.sync_all()
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

/// Best-effort removal; we are already on an error path.
fn cleanup_partial_snapshot(path: &Path) {
    let _ = fs::remove_file(path);
}

fn absolute(path: &Path) -> BackupResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| BackupError::io(path, e))?;
    Ok(cwd.join(path))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
