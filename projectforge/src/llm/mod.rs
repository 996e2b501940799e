//! LLM provider abstraction.
//!
//! The crew engine talks to models only through [`LlmProvider`]; the HTTP
//! implementation lives behind the `http` feature.

mod model;
#[cfg(feature = "http")]
mod openai;
mod types;

pub use model::{ModelId, GEMINI_BASE_URL, OPENAI_BASE_URL};
#[cfg(feature = "http")]
pub use openai::{OpenAiCompatConfig, OpenAiCompatProvider};
pub use types::{ChatMessage, ChatRequest, ChatRole, LlmResponse};

use crate::errors::LlmError;
use async_trait::async_trait;

/// A chat-completion backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Sends one chat request and returns the completion.
    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, LlmError>;
}
