//! Error types for ProjectForge.
//!
//! Each concern has its own error type; [`ForgeError`] wraps them for callers
//! that want a single error surface.

use crate::core::RoleKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for ProjectForge operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Pipeline definition failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// Strict extraction found roles without output.
    #[error("{0}")]
    MissingRoles(#[from] MissingRolesError),

    /// The crew engine failed.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// An LLM provider call failed.
    #[error("{0}")]
    Llm(#[from] LlmError),

    /// Markdown or HTML rendering failed.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// Writing an output file failed.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Configuration was invalid or incomplete.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error raised when the pipeline definition is invalid.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Short machine-readable code.
    pub code: &'static str,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            code,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Creates an error for a dependency cycle.
    #[must_use]
    pub fn cycle(path: Vec<String>) -> Self {
        Self::new(
            "PIPELINE-CYCLE",
            format!("Cycle detected in pipeline: {}", path.join(" -> ")),
        )
        .with_stages(path)
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("stages".to_string(), serde_json::json!(self.stages));
        map
    }
}

/// Error raised by strict extraction when required roles produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Missing outputs for roles: {}. Found only: {}. This may indicate a workflow configuration error.",
    format_keys(.missing),
    format_keys(.found)
)]
pub struct MissingRolesError {
    /// Keys with no readable output.
    pub missing: BTreeSet<RoleKey>,
    /// Keys that did produce output.
    pub found: BTreeSet<RoleKey>,
}

fn format_keys(keys: &BTreeSet<RoleKey>) -> String {
    let names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
    format!("{{{}}}", names.join(", "))
}

/// Errors returned by LLM providers.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The provider throttled the request.
    #[error("Rate limit exceeded: retry after {retry_after:?}s")]
    RateLimited {
        /// Seconds to wait, when the provider says so.
        retry_after: Option<u64>,
    },

    /// The provider returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or summary.
        message: String,
    },

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The response could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Authentication(_) | Self::InvalidResponse(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Minimum wait requested by the provider before the next attempt.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }

    /// Short type name used when the error is reported as text.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "AuthenticationError",
            Self::RateLimited { .. } => "RateLimitError",
            Self::Api { .. } => "APIError",
            Self::Network(_) => "NetworkError",
            Self::Timeout => "TimeoutError",
            Self::InvalidResponse(_) => "InvalidResponseError",
            Self::InvalidRequest(_) => "InvalidRequestError",
        }
    }
}

/// Failure reported by a crew engine run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct EngineError {
    /// Error type name, e.g. `RateLimitError`.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Stage that was executing when the run stopped, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<RoleKey>,
}

impl EngineError {
    /// Creates a new engine error.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stage: None,
        }
    }

    /// Records the stage that failed.
    #[must_use]
    pub fn at_stage(mut self, stage: RoleKey) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(stage) = self.stage {
            map.insert("stage".to_string(), serde_json::json!(stage.as_str()));
        }
        map
    }
}

impl From<LlmError> for EngineError {
    fn from(err: LlmError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<PipelineValidationError> for EngineError {
    fn from(err: PipelineValidationError) -> Self {
        Self::new("PipelineValidationError", err.message)
    }
}

/// Rendering failures.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The markdown renderer could not write its output.
    #[error("markdown conversion failed: {reason}")]
    Markdown {
        /// Underlying reason.
        reason: String,
    },

    /// Rendering one report section failed.
    #[error("section '{section}': {source}")]
    Section {
        /// Section whose text failed to render.
        section: RoleKey,
        /// What went wrong.
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// Attributes the error to a report section.
    #[must_use]
    pub fn in_section(self, section: RoleKey) -> Self {
        Self::Section {
            section,
            source: Box::new(self),
        }
    }
}

/// Failures writing report files.
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct ExportError {
    /// Target path.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

impl ExportError {
    /// Creates a new export error.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Failures converting HTML to PDF. Never fatal; logged and mapped to `None`.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The converter binary is not installed.
    #[error("PDF converter '{0}' not found; install it to enable PDF export")]
    ConverterMissing(String),

    /// The converter ran but failed.
    #[error("PDF converter exited with status {status}: {stderr}")]
    ConverterFailed {
        /// Exit status as text.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The converter produced no output.
    #[error("PDF converter produced no output")]
    EmptyOutput,

    /// I/O while talking to the converter.
    #[error("PDF converter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_roles_message_names_both_sets() {
        let err = MissingRolesError {
            missing: [RoleKey::Quality, RoleKey::Manager].into_iter().collect(),
            found: [RoleKey::Intake].into_iter().collect(),
        };

        let msg = err.to_string();
        assert!(msg.contains("Missing outputs for roles: {quality, manager}"));
        assert!(msg.contains("Found only: {intake}"));
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::new("RateLimitError", "slow down").at_stage(RoleKey::Quality);
        assert_eq!(err.to_string(), "RateLimitError: slow down");

        let dict = err.to_dict();
        assert_eq!(dict.get("stage").unwrap(), "quality");
    }

    #[test]
    fn test_llm_error_retryable() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::RateLimited { retry_after: None }.is_retryable());
        assert!(LlmError::Api { status: 503, message: String::new() }.is_retryable());
        assert!(!LlmError::Api { status: 400, message: String::new() }.is_retryable());
        assert!(!LlmError::Authentication("bad key".into()).is_retryable());
    }

    #[test]
    fn test_llm_error_retry_after() {
        let err = LlmError::RateLimited { retry_after: Some(7) };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(LlmError::RateLimited { retry_after: None }.retry_after(), None);
        assert_eq!(LlmError::Timeout.retry_after(), None);
    }

    #[test]
    fn test_llm_error_converts_to_engine_error() {
        let err: EngineError = LlmError::Authentication("bad key".into()).into();
        assert_eq!(err.kind, "AuthenticationError");
        assert_eq!(err.message, "Authentication error: bad key");
    }

    #[test]
    fn test_render_error_names_section() {
        let err = RenderError::Markdown { reason: "fmt".into() }.in_section(RoleKey::Architect);
        assert_eq!(err.to_string(), "section 'architect': markdown conversion failed: fmt");
    }

    #[test]
    fn test_cycle_error() {
        let err = PipelineValidationError::cycle(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(err.code, "PIPELINE-CYCLE");
        assert_eq!(err.to_dict().get("code").unwrap(), "PIPELINE-CYCLE");
    }
}
