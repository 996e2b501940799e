//! Per-stage execution outcomes as reported by a crew engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse status of a stage, derived from its [`StageOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage produced output.
    Succeeded,
    /// Stage ran and failed.
    Failed,
    /// Stage never started.
    NotRun,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::NotRun => write!(f, "not_run"),
        }
    }
}

/// What happened when the engine attempted a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage finished with this raw text output.
    Succeeded(String),
    /// The stage ran and failed for this reason.
    Failed(String),
    /// The run stopped before this stage started.
    NotRun,
}

impl StageOutcome {
    /// Returns the coarse status.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        match self {
            Self::Succeeded(_) => StageStatus::Succeeded,
            Self::Failed(_) => StageStatus::Failed,
            Self::NotRun => StageStatus::NotRun,
        }
    }

    /// Returns the output text if the stage succeeded.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Succeeded(text) => Some(text),
            Self::Failed(_) | Self::NotRun => None,
        }
    }

    /// Returns true if the stage produced output.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// One stage execution record: the agent that owned the stage and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Role label of the agent assigned to the stage, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
    /// Execution outcome.
    pub outcome: StageOutcome,
}

impl TaskRecord {
    /// Creates a record for an agent-owned stage.
    #[must_use]
    pub fn new(agent_role: impl Into<String>, outcome: StageOutcome) -> Self {
        Self {
            agent_role: Some(agent_role.into()),
            outcome,
        }
    }

    /// Creates a succeeded record.
    #[must_use]
    pub fn succeeded(agent_role: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(agent_role, StageOutcome::Succeeded(output.into()))
    }

    /// Creates a failed record.
    #[must_use]
    pub fn failed(agent_role: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(agent_role, StageOutcome::Failed(reason.into()))
    }

    /// Creates a record for a stage that never ran.
    #[must_use]
    pub fn not_run(agent_role: impl Into<String>) -> Self {
        Self::new(agent_role, StageOutcome::NotRun)
    }

    /// Creates a record with no agent attached.
    #[must_use]
    pub fn unassigned(outcome: StageOutcome) -> Self {
        Self {
            agent_role: None,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = StageOutcome::Succeeded("text".into());
        assert_eq!(ok.output(), Some("text"));
        assert_eq!(ok.status(), StageStatus::Succeeded);
        assert!(ok.is_success());

        let failed = StageOutcome::Failed("boom".into());
        assert_eq!(failed.output(), None);
        assert_eq!(failed.status(), StageStatus::Failed);

        assert_eq!(StageOutcome::NotRun.status(), StageStatus::NotRun);
        assert!(!StageOutcome::NotRun.is_success());
    }

    #[test]
    fn test_record_constructors() {
        let rec = TaskRecord::succeeded("Project Manager", "plan");
        assert_eq!(rec.agent_role.as_deref(), Some("Project Manager"));
        assert_eq!(rec.outcome.output(), Some("plan"));

        let rec = TaskRecord::unassigned(StageOutcome::NotRun);
        assert!(rec.agent_role.is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StageStatus::NotRun.to_string(), "not_run");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(StageOutcome::Failed("timeout".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "detail": "timeout"}));

        let back: StageOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, StageOutcome::Failed("timeout".into()));
    }
}
