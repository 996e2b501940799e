//! Record and output fixtures.

use crate::core::{RoleKey, StageOutcome, TaskRecord};
use crate::extract::ExtractedOutputs;

/// A record owned by the canonical agent for `key`.
#[must_use]
pub fn record_for(key: RoleKey, outcome: StageOutcome) -> TaskRecord {
    TaskRecord::new(key.role_name(), outcome)
}

/// One successful record per role, in pipeline order, with text
/// `"<key> output"`.
#[must_use]
pub fn all_succeeded_records() -> Vec<TaskRecord> {
    RoleKey::ALL
        .into_iter()
        .map(|k| record_for(k, StageOutcome::Succeeded(format!("{k} output"))))
        .collect()
}

/// Records for a run that succeeded for the first `completed` stages, failed
/// on the next one and never reached the rest.
#[must_use]
pub fn failed_after(completed: usize, reason: &str) -> Vec<TaskRecord> {
    RoleKey::ALL
        .into_iter()
        .enumerate()
        .map(|(i, k)| {
            let outcome = match i.cmp(&completed) {
                std::cmp::Ordering::Less => StageOutcome::Succeeded(format!("{k} output")),
                std::cmp::Ordering::Equal => StageOutcome::Failed(reason.to_string()),
                std::cmp::Ordering::Greater => StageOutcome::NotRun,
            };
            record_for(k, outcome)
        })
        .collect()
}

/// Outputs with small markdown bodies for every section.
#[must_use]
pub fn sample_outputs() -> ExtractedOutputs {
    ExtractedOutputs::empty()
        .with(RoleKey::Intake, "## Features\n\n1. **Trip logging**\n2. Google Login")
        .with(
            RoleKey::Architect,
            "### Schema\n\n- users\n  - id\n\n```json\n{\"trip\": 1}\n```",
        )
        .with(RoleKey::Quality, "- Privacy of location data\n- Offline mode")
        .with(RoleKey::Synthesis, "Use `PostgreSQL` and OAuth.")
        .with(
            RoleKey::Manager,
            "## Roadmap\n\n| Feature | Effort |\n|---|---|\n| Trips | M |",
        )
}
