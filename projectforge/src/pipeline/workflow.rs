//! The fixed five-stage ProjectForge pipeline.
//!
//! Dependency edges: intake → architect → {quality, synthesis},
//! quality → synthesis, {intake, synthesis} → manager.

use super::{create_agents, AgentSpec, PipelineBuilder, StagePlan, StageSpec};
use crate::core::RoleKey;
use crate::errors::PipelineValidationError;

/// Name given to the ProjectForge pipeline.
pub const PIPELINE_NAME: &str = "projectforge-analysis";

/// Creates the five stage specifications for a project idea.
#[must_use]
pub fn create_stages(user_input: &str) -> Vec<StageSpec> {
    let intake = StageSpec::new(
        RoleKey::Intake,
        format!("Analyze this project idea: '{user_input}'"),
        "A list of 3 priority features with business justifications. \
         Use standard Markdown formatting. Do not use tables.",
    );

    let architect = StageSpec::new(
        RoleKey::Architect,
        "Create the technical requirements (Schema, APIs) for the features identified.",
        "A technical brief with Database Schema, API Endpoints, and Integrations. \
         Format the database schema using nested markdown bullet points. \
         Format API endpoints using bold text and code blocks (```json) for payloads. \
         Do not use markdown tables.",
    )
    .with_context([RoleKey::Intake]);

    let quality = StageSpec::new(
        RoleKey::Quality,
        "Review the technical brief from the Architect.\n\
         Find 3 potential 'Edge Cases' or 'Risks' the Architect missed \
         (e.g., Privacy, Offline Mode, Data Validation).",
        "A 'Risk Assessment' report with 3 critical gaps and suggested fixes.",
    )
    .with_context([RoleKey::Architect]);

    let synthesis = StageSpec::new(
        RoleKey::Synthesis,
        "Synthesize the technical architecture and risk assessment into a concise \
         1-page executive summary.\n\
         Extract only the most critical technical decisions, architecture choices, \
         and risk mitigation strategies.\n\
         Focus on business-relevant information that a PM needs to create a roadmap.",
        "A strict 1-page summary with: (1) Key technical architecture decisions in \
         bullet points, (2) Top 3 critical risks with mitigation strategies, \
         (3) Integration dependencies. Use clear, non-technical language.",
    )
    .with_context([RoleKey::Architect, RoleKey::Quality]);

    let manager = StageSpec::new(
        RoleKey::Manager,
        "Create an executive summary with:\n\
         1. Project overview (1 paragraph)\n\
         2. Key features prioritized by effort vs impact\n\
         3. Critical risks and mitigation strategies\n\
         4. Recommended sprint breakdown (2-week sprints)\n\
         5. Success metrics",
        "Executive summary with sprint plan and success criteria. \
         Output the roadmap using standard H2 and H3 markdown headers. \
         If comparing features, use a markdown table.",
    )
    .with_context([RoleKey::Intake, RoleKey::Synthesis]);

    vec![intake, architect, quality, synthesis, manager]
}

/// Agents plus a validated stage plan, ready to hand to an engine.
#[derive(Debug, Clone)]
pub struct Crew {
    /// Agents available to the crew.
    pub agents: Vec<AgentSpec>,
    /// The validated stage plan.
    pub plan: StagePlan,
    /// Whether to ask a human for feedback after each stage.
    pub interactive: bool,
}

impl Crew {
    /// Returns the agent assigned to a stage.
    #[must_use]
    pub fn agent_for(&self, stage: &StageSpec) -> Option<&AgentSpec> {
        self.agents.iter().find(|a| a.key == stage.key)
    }
}

/// Builds the ProjectForge crew for a project idea.
///
/// # Errors
///
/// Returns an error if the stage definitions fail validation.
pub fn build_crew(user_input: &str, interactive: bool) -> Result<Crew, PipelineValidationError> {
    let mut builder = PipelineBuilder::new(PIPELINE_NAME);
    for spec in create_stages(user_input) {
        builder.add_stage_spec(spec)?;
    }

    Ok(Crew {
        agents: create_agents(),
        plan: builder.build()?,
        interactive,
    })
}
