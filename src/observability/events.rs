//! Observable events
//!
//! Every lifecycle step of a record store that leaves a trace in the logs is
//! one variant here. Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Store configuration loaded and validated
    ConfigLoaded,

    // Record sets
    /// Record set read from disk
    TableLoaded,
    /// Record set passed validation
    TableValidated,
    /// Record set failed validation
    ValidationFailed,
    /// Rows upserted into a record set
    MergeApplied,

    // Backup rotation
    /// Content equals the current reference, nothing written
    SaveSkipped,
    /// Immutable snapshot written and synced
    SnapshotWritten,
    /// Reference now points at the new snapshot
    ReferenceRepointed,
    /// Existing reference could not be loaded; treated as changed
    ReferenceUnreadable,
    /// Dry run computed a would-be snapshot
    DryRun,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::TableLoaded => "TABLE_LOADED",
            Event::TableValidated => "TABLE_VALIDATED",
            Event::ValidationFailed => "TABLE_VALIDATION_FAILED",
            Event::MergeApplied => "TABLE_MERGE_APPLIED",

            Event::SaveSkipped => "SAVE_SKIPPED_UNCHANGED",
            Event::SnapshotWritten => "SNAPSHOT_WRITTEN",
            Event::ReferenceRepointed => "REFERENCE_REPOINTED",
            Event::ReferenceUnreadable => "REFERENCE_UNREADABLE",
            Event::DryRun => "SAVE_DRY_RUN",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::TableLoaded | Event::TableValidated => Severity::Trace,
            Event::ValidationFailed | Event::ReferenceUnreadable => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
