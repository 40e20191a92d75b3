//! Backup-rotation persistence
//!
//! A record set is committed by writing an immutable, timestamp-named
//! snapshot into a backup directory next to a stable reference path, then
//! pointing the reference at the snapshot with a symlink.
//!
//! # Design Principles
//!
//! - Snapshots are append-only: never rewritten, never deleted here
//! - The reference is only repointed after the snapshot is fully synced
//! - Saving content equal to the current reference writes nothing
//! - Single writer per dataset; no locking
//!
//! # Usage
//!
//! ```ignore
//! use tabstore::backup::BackupOptions;
//!
//! let written = manifest.save_with_backup(&dataset.join("manifest.tsv"), &BackupOptions::default())?;
//! ```

mod creator;
mod errors;
mod naming;

pub use creator::{resolve_reference, save_with_backup, save_with_backup_at, BackupOptions};
pub use errors::{BackupError, BackupResult};
pub use naming::{
    backup_dir_for, default_backup_dir_name, list_snapshots, parse_snapshot_name, Snapshot,
    TIMESTAMP_FORMAT,
};

use std::path::{Path, PathBuf};

use crate::table::RecordSet;

impl RecordSet {
    /// Commits this record set behind `reference`. See [`save_with_backup`].
    pub fn save_with_backup(
        &self,
        reference: &Path,
        options: &BackupOptions,
    ) -> BackupResult<Option<PathBuf>> {
        save_with_backup(self, reference, options)
    }
}
