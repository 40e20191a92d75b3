//! Observability subsystem
//!
//! Structured JSON-lines logging of record store lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution; a failing log sink never fails an operation
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use tabstore::observability::{log_event, Event};
//!
//! log_event(Event::SnapshotWritten, &[("snapshot", "/data/.manifests/manifest-20240101_1200.tsv")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity, LOG_LEVEL_ENV};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::logger::capture_log;

    #[test]
    fn test_log_event() {
        // Verifies no panic whatever the configured level
        log_event(Event::ConfigLoaded, &[("config", "/tmp/tabstore.json")]);
        log_event(Event::ReferenceUnreadable, &[]);
    }

    #[test]
    fn test_event_line_shape() {
        let event = Event::SnapshotWritten;
        let output = capture_log(event.severity(), event.as_str(), &[("rows", "3")]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "SNAPSHOT_WRITTEN");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["rows"], "3");
    }
}
