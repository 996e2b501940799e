//! Run configuration.
//!
//! Values come from serde defaults, then the environment
//! ([`ForgeConfig::from_env`]), then explicit `with_*` overrides (the CLI
//! applies its flags this way).

use crate::engine::{RetryConfig, DEFAULT_MAX_FEEDBACK_ROUNDS};
use crate::errors::ForgeError;
use crate::export::DEFAULT_PDF_CONVERTER;
use crate::llm::ModelId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Model used when `LLM_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gemini/gemini-2.5-flash";

/// Environment variables read by [`ForgeConfig::from_env`].
pub mod env {
    /// Model identifier, `provider/model`.
    pub const MODEL: &str = "LLM_MODEL";
    /// Primary API key variable.
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
    /// Fallback API key variable.
    pub const API_KEY: &str = "LLM_API_KEY";
    /// Base URL override for the provider.
    pub const BASE_URL: &str = "LLM_BASE_URL";
    /// Per-request timeout in seconds.
    pub const TIMEOUT_SECONDS: &str = "LLM_TIMEOUT_SECONDS";
    /// PDF converter command.
    pub const PDF_CONVERTER: &str = "PROJECTFORGE_PDF_CONVERTER";
    /// Directory for output files.
    pub const OUTPUT_DIR: &str = "PROJECTFORGE_OUTPUT_DIR";
}

/// Configuration for a ProjectForge run.
#[derive(Clone, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Model identifier, e.g. `gemini/gemini-2.5-flash`.
    #[serde(default = "default_model")]
    pub model: String,
    /// API credential. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Provider base URL; derived from the model prefix when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// Sampling temperature; provider default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Directory the CLI writes output files into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// HTML to PDF converter command.
    #[serde(default = "default_pdf_converter")]
    pub pdf_converter: String,
    /// Retry policy for provider calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Feedback rounds allowed per stage in interactive mode.
    #[serde(default = "default_feedback_rounds")]
    pub max_feedback_rounds: usize,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> f64 {
    120.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_pdf_converter() -> String {
    DEFAULT_PDF_CONVERTER.to_string()
}

fn default_feedback_rounds() -> usize {
    DEFAULT_MAX_FEEDBACK_ROUNDS
}

fn timeout_error(value: impl fmt::Display) -> ForgeError {
    ForgeError::Config(format!(
        "{} must be a positive number of seconds within range, got '{value}'",
        env::TIMEOUT_SECONDS
    ))
}

fn checked_timeout(seconds: f64) -> Result<Duration, ForgeError> {
    Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| timeout_error(seconds))
}

fn parse_timeout(raw: &str) -> Result<f64, ForgeError> {
    let seconds = raw.parse::<f64>().map_err(|_| timeout_error(raw))?;
    checked_timeout(seconds).map_err(|_| timeout_error(raw))?;
    Ok(seconds)
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            timeout_seconds: default_timeout(),
            temperature: None,
            output_dir: default_output_dir(),
            pdf_converter: default_pdf_converter(),
            retry: RetryConfig::default(),
            max_feedback_rounds: default_feedback_rounds(),
        }
    }
}

impl fmt::Debug for ForgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForgeConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("temperature", &self.temperature)
            .field("output_dir", &self.output_dir)
            .field("pdf_converter", &self.pdf_converter)
            .field("retry", &self.retry)
            .field("max_feedback_rounds", &self.max_feedback_rounds)
            .finish()
    }
}

impl ForgeConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Config`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ForgeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the process environment, keeping the default for any variable
    /// that does not parse and logging a warning for it.
    #[must_use]
    pub fn from_env_lenient() -> Self {
        Self::from_lookup_lenient(|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Config`] if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, mut problems) = Self::read_lookup(lookup);
        if problems.is_empty() {
            Ok(config)
        } else {
            Err(problems.remove(0))
        }
    }

    /// Like [`ForgeConfig::from_lookup`], but invalid values fall back to
    /// their defaults with a warning.
    #[must_use]
    pub fn from_lookup_lenient<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let (config, problems) = Self::read_lookup(lookup);
        for problem in &problems {
            warn!(error = %problem, "ignoring invalid configuration value");
        }
        config
    }

    fn read_lookup<F>(lookup: F) -> (Self, Vec<ForgeError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();
        let mut problems = Vec::new();

        if let Some(model) = get(env::MODEL) {
            config.model = model;
        }
        config.api_key = get(env::GOOGLE_API_KEY).or_else(|| get(env::API_KEY));
        config.base_url = get(env::BASE_URL);
        if let Some(raw) = get(env::TIMEOUT_SECONDS) {
            match parse_timeout(&raw) {
                Ok(seconds) => config.timeout_seconds = seconds,
                Err(err) => problems.push(err),
            }
        }
        if let Some(converter) = get(env::PDF_CONVERTER) {
            config.pdf_converter = converter;
        }
        if let Some(dir) = get(env::OUTPUT_DIR) {
            config.output_dir = PathBuf::from(dir);
        }

        (config, problems)
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the provider base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the PDF converter command.
    #[must_use]
    pub fn with_pdf_converter(mut self, converter: impl Into<String>) -> Self {
        self.pdf_converter = converter.into();
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Config`] if `timeout_seconds` is not positive or
    /// does not fit a [`Duration`].
    pub fn timeout(&self) -> Result<Duration, ForgeError> {
        checked_timeout(self.timeout_seconds)
    }

    /// Parses the model identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Config`] if the identifier is malformed.
    pub fn model_id(&self) -> Result<ModelId, ForgeError> {
        ModelId::parse(&self.model).map_err(ForgeError::Config)
    }

    /// The configured base URL, or the default for the model's provider.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Config`] if the provider has no known endpoint
    /// and no base URL is configured.
    pub fn resolve_base_url(&self, model: &ModelId) -> Result<String, ForgeError> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        model.default_base_url().map(str::to_string).ok_or_else(|| {
            ForgeError::Config(format!(
                "no known endpoint for provider '{}'; set {}",
                model.provider.as_deref().unwrap_or_default(),
                env::BASE_URL
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ForgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.model, "gemini/gemini-2.5-flash");
        assert_eq!(config.api_key, None);
        assert_eq!(config.pdf_converter, "wkhtmltopdf");
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_env_values() {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("LLM_MODEL", "openai/gpt-4o-mini"),
            ("GOOGLE_API_KEY", "  "),
            ("LLM_API_KEY", "sk-test"),
            ("LLM_TIMEOUT_SECONDS", "30"),
            ("PROJECTFORGE_OUTPUT_DIR", "reports"),
        ]))
        .unwrap();

        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.output_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_google_key_preferred() {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("LLM_API_KEY", "o"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("g"));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = ForgeConfig::from_lookup(lookup(&[("LLM_TIMEOUT_SECONDS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("LLM_TIMEOUT_SECONDS"));
    }

    #[test]
    fn test_lenient_keeps_valid_values() {
        let config = ForgeConfig::from_lookup_lenient(lookup(&[
            ("LLM_MODEL", "openai/gpt-4o-mini"),
            ("LLM_TIMEOUT_SECONDS", "1e30"),
            ("PROJECTFORGE_OUTPUT_DIR", "reports"),
        ]));

        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn test_out_of_range_timeout_rejected() {
        for raw in ["1e30", "0", "-5", "inf", "NaN"] {
            let err = ForgeConfig::from_lookup(lookup(&[("LLM_TIMEOUT_SECONDS", raw)])).unwrap_err();
            assert!(matches!(err, ForgeError::Config(_)), "value {raw}");
        }
    }

    #[test]
    fn test_deserialized_bad_timeout_is_an_error() {
        let config: ForgeConfig = serde_json::from_str(r#"{"timeout_seconds": -1.0}"#).unwrap();
        assert!(matches!(config.timeout(), Err(ForgeError::Config(_))));

        let config: ForgeConfig = serde_json::from_str(r#"{"timeout_seconds": 1e300}"#).unwrap();
        assert!(config.timeout().is_err());
    }

    #[test]
    fn test_base_url_resolution() {
        let config = ForgeConfig::new();
        let gemini = ModelId::parse("gemini/gemini-2.5-flash").unwrap();
        assert_eq!(
            config.resolve_base_url(&gemini).unwrap(),
            crate::llm::GEMINI_BASE_URL
        );

        let local = ModelId::parse("ollama/llama3").unwrap();
        assert!(config.resolve_base_url(&local).is_err());
        let config = config.with_base_url("http://localhost:11434/v1");
        assert_eq!(config.resolve_base_url(&local).unwrap(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ForgeConfig::new().with_api_key("secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ForgeConfig = serde_json::from_str(r#"{"model": "openai/gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "openai/gpt-4o");
        assert_eq!(config.max_feedback_rounds, 3);
        assert_eq!(config.retry.max_attempts, 3);
    }
}
