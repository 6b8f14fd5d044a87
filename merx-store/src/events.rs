use serde::Serialize;
use tracing::{error, info};

/// Structured domain-event sink.
///
/// Events are serialized and emitted through the tracing pipeline; a
/// subscriber can forward them to whatever transport the deployment uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLog;

impl EventLog {
    pub fn new() -> Self {
        Self
    }

    pub fn publish<E: Serialize>(&self, topic: &str, event: &E) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(topic, payload, "domain event"),
            Err(e) => error!(topic, "Failed to serialize domain event: {}", e),
        }
    }
}
