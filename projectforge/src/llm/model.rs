//! Model identifiers of the form `provider/model`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base URL of Gemini's OpenAI-compatible endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// A parsed model identifier such as `gemini/gemini-2.5-flash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId {
    /// Provider prefix, if one was given.
    pub provider: Option<String>,
    /// Model name passed to the provider.
    pub model: String,
}

impl ModelId {
    /// Parses `provider/model` or a bare model name.
    ///
    /// Only the first `/` separates the provider, so
    /// `openrouter/meta/llama-3` keeps `meta/llama-3` as the model name.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier or its model part is empty.
    pub fn parse(id: &str) -> Result<Self, String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("model identifier cannot be empty".to_string());
        }

        let (provider, model) = match id.split_once('/') {
            Some((provider, model)) if !provider.is_empty() => (Some(provider.to_string()), model),
            Some((_, model)) => (None, model),
            None => (None, id),
        };

        if model.trim().is_empty() {
            return Err(format!("model identifier '{id}' has no model name"));
        }

        Ok(Self {
            provider,
            model: model.to_string(),
        })
    }

    /// Default OpenAI-compatible base URL for the provider prefix.
    #[must_use]
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self.provider.as_deref() {
            Some("gemini") => Some(GEMINI_BASE_URL),
            Some("openai") | None => Some(OPENAI_BASE_URL),
            Some(_) => None,
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(p) => write!(f, "{p}/{}", self.model),
            None => f.write_str(&self.model),
        }
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
