//! Backup rotation error types
//!
//! Error codes:
//! - TABSTORE_BACKUP_SNAPSHOT_WRITE
//! - TABSTORE_BACKUP_REPOINT
//! - TABSTORE_BACKUP_CREATE_DIR
//! - TABSTORE_BACKUP_IO
//!
//! A failed snapshot write never touches the reference, so every error here
//! leaves the last committed snapshot reachable.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::table::TableError;

/// Backup rotation error type
#[derive(Debug, Error)]
pub enum BackupError {
    /// Snapshot file could not be created, written or synced
    #[error("Failed to write snapshot {}: {source}", .path.display())]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reference could not be unlinked or relinked
    #[error("Failed to point reference {} at the new snapshot: {source}", .path.display())]
    Repoint {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backup directory could not be created
    #[error("Failed to create backup directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Other filesystem failure (listing, link inspection, fsync)
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl BackupError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BackupError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BackupError::SnapshotWrite { .. } => "TABSTORE_BACKUP_SNAPSHOT_WRITE",
            BackupError::Repoint { .. } => "TABSTORE_BACKUP_REPOINT",
            BackupError::CreateDir { .. } => "TABSTORE_BACKUP_CREATE_DIR",
            BackupError::Io { .. } => "TABSTORE_BACKUP_IO",
            BackupError::Table(e) => e.code(),
        }
    }
}

/// Result type for backup rotation
pub type BackupResult<T> = Result<T, BackupError>;
