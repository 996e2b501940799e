//! Pipeline definition.
//!
//! This module provides:
//! - Agent personas for the five roles
//! - Stage specifications with context edges
//! - A validating builder producing an ordered stage plan
//! - The fixed ProjectForge crew

mod agents;
mod builder;
mod spec;
mod workflow;

pub use agents::{create_agents, AgentSpec};
pub use builder::{PipelineBuilder, StagePlan};
pub use spec::StageSpec;
pub use workflow::{build_crew, create_stages, Crew, PIPELINE_NAME};
