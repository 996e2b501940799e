//! Run and stage events.
//!
//! The engine and the workflow runner report progress through an
//! [`EventSink`]. Sinks never fail the run; a sink that cannot deliver an
//! event drops it.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use crate::core::RoleKey;
use serde_json::Value;

/// A stage started executing.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage produced output.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed after exhausting retries.
pub const STAGE_FAILED: &str = "stage.failed";
/// A stage is being re-run with human feedback.
pub const STAGE_FEEDBACK: &str = "stage.feedback";
/// A workflow run started.
pub const WORKFLOW_STARTED: &str = "workflow.started";
/// A workflow run finished with every stage complete.
pub const WORKFLOW_COMPLETED: &str = "workflow.completed";
/// A workflow run finished with an error.
pub const WORKFLOW_FAILED: &str = "workflow.failed";

/// Builds the payload shared by all stage events.
#[must_use]
pub fn stage_payload(stage: RoleKey, role: &str, extra: Value) -> Value {
    let mut payload = serde_json::json!({
        "stage": stage.as_str(),
        "role": role,
    });
    if let (Value::Object(base), Value::Object(extra)) = (&mut payload, extra) {
        base.extend(extra);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_payload_merges_fields() {
        let payload = stage_payload(
            RoleKey::Architect,
            "Technical Architect",
            serde_json::json!({"attempt": 2}),
        );
        assert_eq!(payload["stage"], "architect");
        assert_eq!(payload["role"], "Technical Architect");
        assert_eq!(payload["attempt"], 2);
    }

    #[test]
    fn test_stage_payload_ignores_non_object_extra() {
        let payload = stage_payload(RoleKey::Intake, "r", Value::Null);
        assert_eq!(payload.as_object().map(|m| m.len()), Some(2));
    }
}
