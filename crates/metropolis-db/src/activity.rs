//! The city activity feed.
//!
//! Simulators report notable transitions (construction finished, residents
//! left, a tenant was jailed) through [`ActivityLogger`]. The engine wires a
//! [`TracingActivityLogger`]; tests use [`RecordingActivityLogger`] to
//! assert on what was logged.

use metropolis_types::{ActivityEntry, ActivityKind};

/// Sink for activity-feed entries.
pub trait ActivityLogger: Send {
    /// Record one entry.
    fn log(&mut self, kind: ActivityKind, message: &str, metadata: serde_json::Value);
}

/// Writes each entry as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingActivityLogger;

impl ActivityLogger for TracingActivityLogger {
    fn log(&mut self, kind: ActivityKind, message: &str, metadata: serde_json::Value) {
        tracing::info!(target: "metropolis::activity", ?kind, %metadata, "{message}");
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingActivityLogger {
    entries: Vec<ActivityEntry>,
}

impl RecordingActivityLogger {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Everything logged so far.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    /// Number of entries of one kind.
    pub fn count(&self, kind: ActivityKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

impl ActivityLogger for RecordingActivityLogger {
    fn log(&mut self, kind: ActivityKind, message: &str, metadata: serde_json::Value) {
        self.entries.push(ActivityEntry {
            kind,
            message: message.to_owned(),
            metadata,
        });
    }
}
