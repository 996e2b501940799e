//! Scripted provider and feedback doubles.

use crate::core::RoleKey;
use crate::engine::FeedbackSource;
use crate::errors::LlmError;
use crate::llm::{ChatRequest, ChatRole, LlmProvider, LlmResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// An LLM provider that answers from a script.
///
/// By default each call is answered with `"<key> output"`, where the key is
/// recovered from the persona in the system message. Queued responses take
/// precedence, and calls registered with [`ScriptedProvider::fail_on_call`]
/// return the given error instead.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    queued: Mutex<VecDeque<String>>,
    failures: Mutex<HashMap<usize, LlmError>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Creates a provider answering by role.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues responses returned in order before falling back to role answers.
    #[must_use]
    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queued
            .lock()
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Makes the `call`-th request (1-based) fail with `error`.
    #[must_use]
    pub fn fail_on_call(self, call: usize, error: LlmError) -> Self {
        self.failures.lock().insert(call, error);
        self
    }

    /// Returns the number of requests received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    fn role_answer(request: &ChatRequest, call: usize) -> String {
        request
            .messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .and_then(|m| RoleKey::from_role_name(&m.content))
            .map_or_else(|| format!("response {call}"), |k| format!("{k} output"))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<LlmResponse, LlmError> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };

        if let Some(err) = self.failures.lock().remove(&call) {
            return Err(err);
        }

        let content = self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| Self::role_answer(&request, call));

        Ok(LlmResponse {
            content,
            model: request.model,
            provider: "scripted".to_string(),
            ..LlmResponse::default()
        })
    }
}

/// Feedback source returning canned answers per stage, once each.
#[derive(Debug, Default)]
pub struct ScriptedFeedback {
    answers: Mutex<HashMap<RoleKey, VecDeque<String>>>,
    asked: Mutex<Vec<RoleKey>>,
}

impl ScriptedFeedback {
    /// Creates a source that accepts every output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues feedback for a stage.
    #[must_use]
    pub fn on(self, stage: RoleKey, feedback: impl Into<String>) -> Self {
        self.answers
            .lock()
            .entry(stage)
            .or_default()
            .push_back(feedback.into());
        self
    }

    /// Stages that were asked for feedback, in order.
    #[must_use]
    pub fn asked(&self) -> Vec<RoleKey> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl FeedbackSource for ScriptedFeedback {
    async fn feedback(&self, stage: RoleKey, _output: &str) -> Option<String> {
        self.asked.lock().push(stage);
        self.answers.lock().get_mut(&stage).and_then(VecDeque::pop_front)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn request(system: &str) -> ChatRequest {
        ChatRequest::new(
            "m",
            vec![ChatMessage::system(system), ChatMessage::user("go")],
        )
    }

    #[tokio::test]
    async fn test_answers_by_role() {
        let provider = ScriptedProvider::new();
        let resp = provider
            .chat(request("You are Technical Architect. Designs."))
            .await
            .unwrap();
        assert_eq!(resp.content, "architect output");

        let resp = provider.chat(request("You are nobody.")).await.unwrap();
        assert_eq!(resp.content, "response 2");
    }

    #[tokio::test]
    async fn test_queue_and_failures() {
        let provider = ScriptedProvider::new()
            .with_responses(["first"])
            .fail_on_call(2, LlmError::Timeout);

        assert_eq!(provider.chat(request("x")).await.unwrap().content, "first");
        assert!(matches!(provider.chat(request("x")).await, Err(LlmError::Timeout)));
        assert!(provider.chat(request("x")).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_feedback() {
        let source = ScriptedFeedback::new().on(RoleKey::Quality, "more risks");
        assert_eq!(source.feedback(RoleKey::Intake, "x").await, None);
        assert_eq!(
            source.feedback(RoleKey::Quality, "x").await.as_deref(),
            Some("more risks")
        );
        assert_eq!(source.feedback(RoleKey::Quality, "x").await, None);
        assert_eq!(
            source.asked(),
            vec![RoleKey::Intake, RoleKey::Quality, RoleKey::Quality]
        );
    }
}
