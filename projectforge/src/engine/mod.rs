//! Crew execution engines.
//!
//! A [`CrewEngine`] runs a [`Crew`]'s stages and reports one [`TaskRecord`]
//! per stage. The run result is separate from the records so a failed run
//! still exposes the stages that did finish.

mod retry;
mod sequential;

pub use retry::{with_retry, with_retry_hinted, BackoffStrategy, JitterStrategy, RetryConfig};
pub use sequential::{build_task_prompt, SequentialCrew, DEFAULT_MAX_FEEDBACK_ROUNDS};

use crate::core::{RoleKey, TaskRecord};
use crate::errors::EngineError;
use crate::pipeline::Crew;
use async_trait::async_trait;

/// Everything an engine reports about one kickoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewRun {
    /// One record per stage, in execution order.
    pub records: Vec<TaskRecord>,
    /// The final stage's output, or the error that stopped the run.
    pub result: Result<String, EngineError>,
}

impl CrewRun {
    /// Creates a run that failed before any stage started.
    #[must_use]
    pub fn aborted(crew: &Crew, error: EngineError) -> Self {
        Self {
            records: crew
                .plan
                .ordered_stages()
                .map(|s| TaskRecord::not_run(s.role.clone()))
                .collect(),
            result: Err(error),
        }
    }

    /// Returns true if the engine finished without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Executes a crew.
#[async_trait]
pub trait CrewEngine: Send + Sync {
    /// Runs every stage of `crew`. Never panics on stage failure; failures are
    /// reported through [`CrewRun::result`].
    async fn kickoff(&self, crew: &Crew) -> CrewRun;
}

/// Source of human feedback for interactive runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackSource: Send + Sync {
    /// Returns feedback on a stage's output. `None` or blank text accepts
    /// the output as is.
    async fn feedback(&self, stage: RoleKey, output: &str) -> Option<String>;
}
