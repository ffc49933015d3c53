//! Attempt audit log port
//!
//! Structured audit events emitted as the engine works. The JSONL adapter
//! in the infrastructure layer appends one JSON object per event.

use serde_json::Value;

/// One audit event with a type tag and an arbitrary JSON payload.
#[derive(Debug, Clone)]
pub struct AttemptEvent {
    /// Event type (e.g. "attempt_logged", "action_blocked")
    pub event_type: String,
    /// Event payload
    pub payload: Value,
}

impl AttemptEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Sink for audit events. Logging must never fail the engine, so the
/// interface is infallible; adapters swallow and warn on I/O errors.
pub trait AttemptLogger: Send + Sync {
    fn log(&self, event: AttemptEvent);
}

/// No-op logger for when auditing is disabled.
pub struct NoAttemptLog;

impl AttemptLogger for NoAttemptLog {
    fn log(&self, _event: AttemptEvent) {}
}
