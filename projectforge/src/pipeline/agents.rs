//! Agent personas for the five crew roles.

use crate::core::RoleKey;
use serde::{Deserialize, Serialize};

/// Descriptor of a crew agent: role, objective and persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Key of the role this agent fills.
    pub key: RoleKey,
    /// Human-readable role label.
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Persona text.
    pub backstory: String,
}

impl AgentSpec {
    /// Creates a new agent descriptor.
    #[must_use]
    pub fn new(
        key: RoleKey,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            key,
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// System prompt presenting the persona to the model.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {role}. {backstory}\nYour personal goal is: {goal}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal,
        )
    }
}

/// Creates the five ProjectForge agents in pipeline order.
#[must_use]
pub fn create_agents() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            RoleKey::Intake,
            RoleKey::Intake.role_name(),
            "Identify core features from messy notes.",
            "You are a veteran Business Analyst expert at identifying user needs.",
        ),
        AgentSpec::new(
            RoleKey::Architect,
            RoleKey::Architect.role_name(),
            "Create a high-level technical implementation plan.",
            "You are a Senior Systems Engineer who designs scalable, secure backends.",
        ),
        AgentSpec::new(
            RoleKey::Quality,
            RoleKey::Quality.role_name(),
            "Identify gaps, security risks, and edge cases in the technical plan.",
            "You are a cynical Senior QA Lead. You look for what could go wrong. \
             You check for data privacy, missing error states, and logic gaps.",
        ),
        AgentSpec::new(
            RoleKey::Synthesis,
            RoleKey::Synthesis.role_name(),
            "Condense complex technical and QA reports into brief, actionable executive bullet points",
            "You are a Staff Engineer who translates technical jargon into business-ready summaries.",
        ),
        AgentSpec::new(
            RoleKey::Manager,
            RoleKey::Manager.role_name(),
            "Create executive summary and next steps from the audit.",
            "You are an experienced PM who synthesizes technical details into \
             actionable roadmaps with clear priorities and timelines.",
        ),
    ]
}
