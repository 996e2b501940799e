//! Test doubles and fixtures for ProjectForge.
//!
//! - [`ScriptedProvider`]: an [`LlmProvider`](crate::llm::LlmProvider) that
//!   answers by role and can be told to fail on a given call
//! - [`ScriptedFeedback`]: canned interactive feedback
//! - record fixtures for extraction tests

mod fixtures;
mod providers;

pub use fixtures::{all_succeeded_records, failed_after, record_for, sample_outputs};
pub use providers::{ScriptedFeedback, ScriptedProvider};
