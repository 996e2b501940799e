//! Sequential crew engine: one provider call per stage, in plan order.

use super::{with_retry_hinted, CrewEngine, CrewRun, FeedbackSource, RetryConfig};
use crate::core::{RoleKey, TaskRecord};
use crate::errors::{EngineError, LlmError};
use crate::events::{self, EventSink, NoOpEventSink};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::pipeline::{AgentSpec, Crew, StageSpec};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Feedback rounds allowed per stage in interactive mode.
pub const DEFAULT_MAX_FEEDBACK_ROUNDS: usize = 3;

/// Builds the user message for a stage from its prompt, its output contract
/// and the outputs of the stages it lists as context.
#[must_use]
pub fn build_task_prompt(stage: &StageSpec, context: &[(RoleKey, &str)]) -> String {
    let mut prompt = format!(
        "{}\n\nThis is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        stage.description, stage.expected_output
    );

    if !context.is_empty() {
        prompt.push_str("\n\nThis is the context you're working with:\n");
        let sections: Vec<String> = context
            .iter()
            .map(|(key, text)| format!("### {} ({key})\n{text}", key.role_name()))
            .collect();
        prompt.push_str(&sections.join("\n\n----------\n\n"));
    }

    prompt
}

fn feedback_prompt(feedback: &str) -> String {
    format!(
        "Human feedback on your previous answer:\n{feedback}\n\n\
         Revise your final answer to address this feedback. Return the complete revised content."
    )
}

/// Runs stages one after another against an [`LlmProvider`].
///
/// Stops at the first stage that fails after retries; that stage is
/// recorded as failed and every later stage as not run.
pub struct SequentialCrew {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: Option<f32>,
    retry: RetryConfig,
    sink: Arc<dyn EventSink>,
    feedback: Option<Arc<dyn FeedbackSource>>,
    max_feedback_rounds: usize,
}

impl fmt::Debug for SequentialCrew {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialCrew")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("retry", &self.retry)
            .field("interactive_feedback", &self.feedback.is_some())
            .field("max_feedback_rounds", &self.max_feedback_rounds)
            .finish()
    }
}

impl SequentialCrew {
    /// Creates an engine calling `model` through `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            retry: RetryConfig::default(),
            sink: Arc::new(NoOpEventSink),
            feedback: None,
            max_feedback_rounds: DEFAULT_MAX_FEEDBACK_ROUNDS,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the retry policy for provider calls.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the sink for stage events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets where interactive feedback comes from. Only consulted when the
    /// crew is interactive.
    #[must_use]
    pub fn with_feedback(mut self, source: Arc<dyn FeedbackSource>) -> Self {
        self.feedback = Some(source);
        self
    }

    /// Caps feedback re-runs per stage.
    #[must_use]
    pub fn with_max_feedback_rounds(mut self, rounds: usize) -> Self {
        self.max_feedback_rounds = rounds;
        self
    }

    /// Returns the model name sent to the provider.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, stage: RoleKey, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let request = ChatRequest::new(self.model.clone(), messages)
            .with_temperature(self.temperature);
        let response = with_retry_hinted(
            &self.retry,
            stage.as_str(),
            LlmError::is_retryable,
            LlmError::retry_after,
            || self.provider.chat(request.clone()),
        )
        .await?;
        tracing::debug!(stage = %stage, attributes = ?response.to_attributes(), "stage call finished");
        Ok(response.content)
    }

    async fn run_stage(
        &self,
        agent: &AgentSpec,
        stage: &StageSpec,
        interactive: bool,
        outputs: &HashMap<RoleKey, String>,
    ) -> Result<String, LlmError> {
        let context: Vec<(RoleKey, &str)> = stage
            .context
            .iter()
            .filter_map(|k| outputs.get(k).map(|text| (*k, text.as_str())))
            .collect();

        let mut messages = vec![
            ChatMessage::system(agent.system_prompt()),
            ChatMessage::user(build_task_prompt(stage, &context)),
        ];
        let mut output = self.complete(stage.key, messages.clone()).await?;

        let Some(source) = self.feedback.as_ref().filter(|_| interactive) else {
            return Ok(output);
        };

        for round in 1..=self.max_feedback_rounds {
            let feedback = match source.feedback(stage.key, &output).await {
                Some(text) if !text.trim().is_empty() => text,
                _ => break,
            };
            self.sink
                .emit(
                    events::STAGE_FEEDBACK,
                    Some(events::stage_payload(
                        stage.key,
                        &stage.role,
                        serde_json::json!({"round": round}),
                    )),
                )
                .await;
            info!(stage = %stage.key, round, "re-running stage with human feedback");

            messages.push(ChatMessage::assistant(output));
            messages.push(ChatMessage::user(feedback_prompt(feedback.trim())));
            output = self.complete(stage.key, messages.clone()).await?;
        }

        Ok(output)
    }
}

#[async_trait]
impl CrewEngine for SequentialCrew {
    async fn kickoff(&self, crew: &Crew) -> CrewRun {
        let stages: Vec<&StageSpec> = crew.plan.ordered_stages().collect();
        let mut records = Vec::with_capacity(stages.len());
        let mut outputs: HashMap<RoleKey, String> = HashMap::new();
        let mut last_output = String::new();

        for (index, stage) in stages.iter().enumerate() {
            self.sink
                .emit(
                    events::STAGE_STARTED,
                    Some(events::stage_payload(
                        stage.key,
                        &stage.role,
                        serde_json::json!({"index": index}),
                    )),
                )
                .await;

            let result = match crew.agent_for(stage) {
                Some(agent) => self
                    .run_stage(agent, stage, crew.interactive, &outputs)
                    .await
                    .map_err(EngineError::from),
                None => Err(EngineError::new(
                    "ConfigurationError",
                    format!("no agent assigned to stage '{}'", stage.key),
                )),
            };

            match result {
                Ok(text) => {
                    self.sink
                        .emit(
                            events::STAGE_COMPLETED,
                            Some(events::stage_payload(
                                stage.key,
                                &stage.role,
                                serde_json::json!({"chars": text.len()}),
                            )),
                        )
                        .await;
                    info!(stage = %stage.key, chars = text.len(), "stage completed");
                    records.push(TaskRecord::succeeded(stage.role.clone(), text.clone()));
                    outputs.insert(stage.key, text.clone());
                    last_output = text;
                }
                Err(err) => {
                    let err = err.at_stage(stage.key);
                    self.sink
                        .emit(
                            events::STAGE_FAILED,
                            Some(events::stage_payload(
                                stage.key,
                                &stage.role,
                                serde_json::json!({"error": err.to_string(), "kind": err.kind}),
                            )),
                        )
                        .await;
                    warn!(stage = %stage.key, error = %err, "stage failed; skipping remaining stages");
                    records.push(TaskRecord::failed(stage.role.clone(), err.to_string()));
                    records.extend(
                        stages[index + 1..]
                            .iter()
                            .map(|s| TaskRecord::not_run(s.role.clone())),
                    );
                    return CrewRun {
                        records,
                        result: Err(err),
                    };
                }
            }
        }

        CrewRun {
            records,
            result: Ok(last_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::engine::{JitterStrategy, MockFeedbackSource};
    use crate::events::CollectingEventSink;
    use crate::llm::{ChatRole, LlmResponse, MockLlmProvider};
    use crate::pipeline::build_crew;
    use crate::testing::ScriptedProvider;

    fn fast_retry(attempts: usize) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(attempts)
            .with_base_delay_ms(1)
            .with_jitter(JitterStrategy::None)
    }

    #[test]
    fn test_task_prompt_without_context() {
        let stage = StageSpec::new(RoleKey::Intake, "Analyze this", "Three features");
        let prompt = build_task_prompt(&stage, &[]);
        assert!(prompt.starts_with("Analyze this\n\n"));
        assert!(prompt.contains("expected criteria for your final answer: Three features"));
        assert!(!prompt.contains("context you're working with"));
    }

    #[test]
    fn test_task_prompt_with_context() {
        let stage = StageSpec::new(RoleKey::Synthesis, "Summarise", "One page")
            .with_context([RoleKey::Architect, RoleKey::Quality]);
        let prompt = build_task_prompt(
            &stage,
            &[(RoleKey::Architect, "schema"), (RoleKey::Quality, "risks")],
        );
        let arch = prompt.find("schema").unwrap();
        let qa = prompt.find("risks").unwrap();
        assert!(arch < qa);
        assert!(prompt.contains("### Technical Architect (architect)"));
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let provider = Arc::new(ScriptedProvider::new());
        let sink = Arc::new(CollectingEventSink::new());
        let engine = SequentialCrew::new(provider.clone(), "gemini-2.5-flash")
            .with_event_sink(sink.clone());
        let crew = build_crew("idea", false).unwrap();

        let run = engine.kickoff(&crew).await;

        assert_eq!(run.result, Ok("manager output".to_string()));
        assert_eq!(run.records.len(), 5);
        assert!(run.records.iter().all(|r| r.outcome.is_success()));
        assert_eq!(provider.call_count(), 5);
        assert_eq!(sink.events_of_type("stage.completed").len(), 5);
        assert!(provider.requests().iter().all(|r| r.model == "gemini-2.5-flash"));
    }

    #[tokio::test]
    async fn test_only_declared_context_is_passed() {
        let provider = Arc::new(ScriptedProvider::new());
        let engine = SequentialCrew::new(provider.clone(), "m");
        let crew = build_crew("idea", false).unwrap();
        engine.kickoff(&crew).await;

        let requests = provider.requests();
        let quality = requests[2].last_user_message().unwrap();
        assert!(quality.contains("architect output"));
        assert!(!quality.contains("intake output"));

        let manager = requests[4].last_user_message().unwrap();
        assert!(manager.contains("intake output"));
        assert!(manager.contains("synthesis output"));
        assert!(!manager.contains("quality output"));
    }

    #[tokio::test]
    async fn test_failure_stops_run() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_on_call(3, LlmError::Authentication("bad key".into())),
        );
        let sink = Arc::new(CollectingEventSink::new());
        let engine = SequentialCrew::new(provider.clone(), "m")
            .with_retry(fast_retry(3))
            .with_event_sink(sink.clone());
        let crew = build_crew("idea", false).unwrap();

        let run = engine.kickoff(&crew).await;

        let statuses: Vec<StageStatus> = run.records.iter().map(|r| r.outcome.status()).collect();
        assert_eq!(
            statuses,
            vec![
                StageStatus::Succeeded,
                StageStatus::Succeeded,
                StageStatus::Failed,
                StageStatus::NotRun,
                StageStatus::NotRun,
            ]
        );
        let err = run.result.unwrap_err();
        assert_eq!(err.kind, "AuthenticationError");
        assert_eq!(err.stage, Some(RoleKey::Quality));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(sink.events_of_type("stage.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_is_retried_until_exhausted() {
        let mut mock = MockLlmProvider::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_chat()
            .times(2)
            .returning(|_| Err(LlmError::RateLimited { retry_after: None }));

        let engine = SequentialCrew::new(Arc::new(mock), "m").with_retry(fast_retry(2));
        let crew = build_crew("idea", false).unwrap();
        let run = engine.kickoff(&crew).await;

        let err = run.result.unwrap_err();
        assert_eq!(err.kind, "RateLimitError");
        assert_eq!(err.stage, Some(RoleKey::Intake));
        assert_eq!(run.records[0].outcome.status(), StageStatus::Failed);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_on_call(1, LlmError::RateLimited { retry_after: Some(1) }),
        );
        let engine = SequentialCrew::new(provider.clone(), "m")
            .with_retry(fast_retry(2).with_max_delay_ms(60));
        let crew = build_crew("idea", false).unwrap();

        let started = std::time::Instant::now();
        let run = engine.kickoff(&crew).await;

        assert!(run.is_success());
        assert_eq!(provider.call_count(), 6);
        assert!(started.elapsed() >= std::time::Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_transient_error_recovers() {
        let provider = Arc::new(ScriptedProvider::new().fail_on_call(1, LlmError::Timeout));
        let engine = SequentialCrew::new(provider.clone(), "m").with_retry(fast_retry(3));
        let crew = build_crew("idea", false).unwrap();

        let run = engine.kickoff(&crew).await;
        assert!(run.is_success());
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test]
    async fn test_interactive_feedback_reruns_stage() {
        let mut mock = MockLlmProvider::new();
        mock.expect_name().return_const("mock".to_string());
        mock.expect_chat().returning(|req| {
            let revised = req.messages.iter().any(|m| m.role == ChatRole::Assistant);
            Ok(LlmResponse::text(if revised { "revised" } else { "draft" }))
        });

        let mut feedback = MockFeedbackSource::new();
        feedback
            .expect_feedback()
            .returning(|stage, output| {
                (stage == RoleKey::Intake && output == "draft").then(|| "add pricing".to_string())
            });

        let sink = Arc::new(CollectingEventSink::new());
        let engine = SequentialCrew::new(Arc::new(mock), "m")
            .with_feedback(Arc::new(feedback))
            .with_event_sink(sink.clone());
        let crew = build_crew("idea", true).unwrap();

        let run = engine.kickoff(&crew).await;

        assert_eq!(run.records[0].outcome.output(), Some("revised"));
        assert_eq!(run.records[1].outcome.output(), Some("draft"));
        assert_eq!(sink.events_of_type("stage.feedback").len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_ignored_when_not_interactive() {
        let mut feedback = MockFeedbackSource::new();
        feedback.expect_feedback().never();

        let engine = SequentialCrew::new(Arc::new(ScriptedProvider::new()), "m")
            .with_feedback(Arc::new(feedback));
        let crew = build_crew("idea", false).unwrap();
        assert!(engine.kickoff(&crew).await.is_success());
    }

    #[tokio::test]
    async fn test_feedback_rounds_are_bounded() {
        let mut feedback = MockFeedbackSource::new();
        feedback
            .expect_feedback()
            .returning(|_, _| Some("again".to_string()));

        let provider = Arc::new(ScriptedProvider::new());
        let engine = SequentialCrew::new(provider.clone(), "m")
            .with_feedback(Arc::new(feedback))
            .with_max_feedback_rounds(2);
        let crew = build_crew("idea", true).unwrap();
        engine.kickoff(&crew).await;

        assert_eq!(provider.call_count(), 15);
    }
}
