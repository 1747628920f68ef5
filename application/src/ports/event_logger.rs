//! Port for structured workflow event logging.
//!
//! Defines the [`WorkflowEventLogger`] trait for recording workflow events
//! (stage attempts, transitions, reviews, diagrams) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable record of the run (JSONL).

use serde_json::Value;

/// A structured workflow event for logging.
///
/// Each event has a type string and a JSON payload containing event-specific
/// fields. The adapter adds the timestamp when it writes the record.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowEvent {
    /// Event type identifier (e.g., "stage_attempt", "transition", "review").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl WorkflowEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging workflow events to a structured log.
///
/// The `log` method is synchronous and non-fallible; write failures are
/// dropped by the adapter.
pub trait WorkflowEventLogger: Send + Sync {
    /// Record a workflow event.
    fn log(&self, event: WorkflowEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoWorkflowLogger;

impl WorkflowEventLogger for NoWorkflowLogger {
    fn log(&self, _event: WorkflowEvent) {}
}
