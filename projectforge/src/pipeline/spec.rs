//! Stage specifications.

use crate::core::RoleKey;
use crate::errors::PipelineValidationError;
use serde::{Deserialize, Serialize};

/// Specification for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Short key of the stage; also the role it is assigned to.
    pub key: RoleKey,
    /// Declared role name of the owning agent.
    pub role: String,
    /// Prompt text describing the work.
    pub description: String,
    /// Free-text contract for the shape of the output.
    pub expected_output: String,
    /// Upstream stages whose outputs are passed as context, in order.
    pub context: Vec<RoleKey>,
}

impl StageSpec {
    /// Creates a new stage owned by the canonical role for `key`.
    #[must_use]
    pub fn new(
        key: RoleKey,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            key,
            role: key.role_name().to_string(),
            description: description.into(),
            expected_output: expected_output.into(),
            context: Vec::new(),
        }
    }

    /// Sets the context dependencies.
    #[must_use]
    pub fn with_context(mut self, deps: impl IntoIterator<Item = RoleKey>) -> Self {
        self.context = deps.into_iter().collect();
        self
    }

    /// Overrides the declared role label.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Validates the stage in isolation.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage depends on itself or lists a dependency twice.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.context.contains(&self.key) {
            return Err(PipelineValidationError::new(
                "PIPELINE-SELF-DEP",
                format!("Stage '{}' cannot depend on itself", self.key),
            )
            .with_stages(vec![self.key.to_string()]));
        }
        for (i, dep) in self.context.iter().enumerate() {
            if self.context[..i].contains(dep) {
                return Err(PipelineValidationError::new(
                    "PIPELINE-DUP-DEP",
                    format!("Stage '{}' lists dependency '{dep}' more than once", self.key),
                )
                .with_stages(vec![self.key.to_string(), dep.to_string()]));
            }
        }
        Ok(())
    }
}
