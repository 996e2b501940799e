//! Workflow runner.
//!
//! A run never fails as a whole: whatever the engine does, the outputs are
//! extracted in safe mode and rendered, and problems are reported through
//! [`WorkflowResult::error`].

use crate::config::ForgeConfig;
use crate::core::TaskRecord;
use crate::engine::{CrewEngine, FeedbackSource};
use crate::errors::EngineError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::extract::{extract_safe, ExtractedOutputs};
use crate::observability::{run_span, RunTimer};
use crate::pipeline::build_crew;
use crate::render::{html_document, render_sections, text_report};
use crate::utils::RunClock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Input for one analysis run.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkflowRequest {
    /// Free-text project idea.
    pub user_input: String,
    /// Model identifier, e.g. `gemini/gemini-2.5-flash`.
    pub model: String,
    /// Provider credential.
    pub api_key: String,
    /// Ask for human feedback after each stage.
    pub interactive: bool,
}

impl std::fmt::Debug for WorkflowRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowRequest")
            .field("user_input", &self.user_input)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("interactive", &self.interactive)
            .finish()
    }
}

impl WorkflowRequest {
    /// Creates a non-interactive request.
    #[must_use]
    pub fn new(
        user_input: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            model: model.into(),
            api_key: api_key.into(),
            interactive: false,
        }
    }

    /// Sets interactive mode.
    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Fails when the credential is blank. This is the only credential check
    /// made before a run.
    fn check_credentials(&self) -> Result<(), EngineError> {
        if self.api_key.trim().is_empty() {
            return Err(EngineError::new(
                "AuthenticationError",
                "no API key provided; set GOOGLE_API_KEY or LLM_API_KEY",
            ));
        }
        Ok(())
    }
}

/// Outcome of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// True if the engine finished without error.
    pub success: bool,
    /// The project idea the run was given.
    pub user_input: String,
    /// Section texts, with the incomplete sentinel for missing ones.
    pub outputs: ExtractedOutputs,
    /// Section texts as extracted, `None` where a stage produced nothing.
    pub raw_outputs: ExtractedOutputs,
    /// Full HTML report; empty if rendering failed.
    pub html_content: String,
    /// Run timestamp, `YYYYMMDD_HHMMSS`.
    pub timestamp: String,
    /// Human-readable generation time used in report headers.
    pub generated_at: String,
    /// `"<ErrorType>: <message>"` for engine failures, or the rendering
    /// failure if HTML generation failed.
    pub error: Option<String>,
    /// Final stage output when the engine succeeded.
    pub raw_result: Option<String>,
    /// Per-stage records reported by the engine.
    pub records: Vec<TaskRecord>,
}

impl WorkflowResult {
    /// Renders the plain-text report for this run.
    #[must_use]
    pub fn text_report(&self) -> String {
        text_report(&self.user_input, &self.generated_at, &self.outputs)
    }

    /// Returns true if some stage output is missing.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.raw_outputs.is_complete()
    }
}

/// Runs the analysis once with `engine`.
///
/// Never fails; see [`WorkflowResult::success`] and
/// [`WorkflowResult::error`].
pub async fn run_analysis_workflow(
    request: &WorkflowRequest,
    engine: &dyn CrewEngine,
) -> WorkflowResult {
    let engine = request.check_credentials().map(|()| engine);
    execute(request, engine, &NoOpEventSink, RunClock::now()).await
}

/// Reusable runner holding configuration, an event sink and optionally a
/// fixed engine.
///
/// Without a fixed engine, each run builds a [`SequentialCrew`] over an
/// OpenAI-compatible HTTP provider from the request's model and key.
///
/// [`SequentialCrew`]: crate::engine::SequentialCrew
pub struct Workflow {
    config: ForgeConfig,
    sink: Arc<dyn EventSink>,
    engine: Option<Arc<dyn CrewEngine>>,
    feedback: Option<Arc<dyn FeedbackSource>>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("config", &self.config)
            .field("fixed_engine", &self.engine.is_some())
            .field("feedback", &self.feedback.is_some())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Creates a runner.
    #[must_use]
    pub fn new(config: ForgeConfig) -> Self {
        Self {
            config,
            sink: Arc::new(NoOpEventSink),
            engine: None,
            feedback: None,
        }
    }

    /// Sets the event sink for run and stage events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Uses `engine` for every run instead of building one.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn CrewEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the feedback source used for interactive runs.
    #[must_use]
    pub fn with_feedback(mut self, source: Arc<dyn FeedbackSource>) -> Self {
        self.feedback = Some(source);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Runs the analysis for `request`.
    pub async fn run(&self, request: &WorkflowRequest) -> WorkflowResult {
        let engine = request
            .check_credentials()
            .and_then(|()| self.resolve_engine(request));
        let engine = match &engine {
            Ok(engine) => Ok(&**engine),
            Err(err) => Err(err.clone()),
        };
        execute(request, engine, self.sink.as_ref(), RunClock::now()).await
    }

    fn resolve_engine(&self, request: &WorkflowRequest) -> Result<Arc<dyn CrewEngine>, EngineError> {
        match &self.engine {
            Some(engine) => Ok(Arc::clone(engine)),
            None => self.build_engine(request),
        }
    }

    #[cfg(feature = "http")]
    fn build_engine(&self, request: &WorkflowRequest) -> Result<Arc<dyn CrewEngine>, EngineError> {
        use crate::engine::SequentialCrew;
        use crate::errors::ForgeError;
        use crate::llm::{ModelId, OpenAiCompatConfig, OpenAiCompatProvider};

        let config_error = |e: String| EngineError::new("ConfigurationError", e);
        let forge_error = |e: ForgeError| match e {
            ForgeError::Config(msg) => config_error(msg),
            other => config_error(other.to_string()),
        };
        let model = ModelId::parse(&request.model).map_err(config_error)?;
        let base_url = self.config.resolve_base_url(&model).map_err(forge_error)?;
        let timeout = self.config.timeout().map_err(forge_error)?;

        let provider = OpenAiCompatProvider::new(OpenAiCompatConfig {
            api_key: request.api_key.clone(),
            base_url,
            provider_name: model.provider.clone().unwrap_or_else(|| "openai".to_string()),
            timeout,
        })?;

        let mut engine = SequentialCrew::new(Arc::new(provider), model.model)
            .with_temperature(self.config.temperature)
            .with_retry(self.config.retry.clone())
            .with_event_sink(Arc::clone(&self.sink))
            .with_max_feedback_rounds(self.config.max_feedback_rounds);
        if let Some(source) = &self.feedback {
            engine = engine.with_feedback(Arc::clone(source));
        }
        Ok(Arc::new(engine))
    }

    #[cfg(not(feature = "http"))]
    fn build_engine(&self, _request: &WorkflowRequest) -> Result<Arc<dyn CrewEngine>, EngineError> {
        Err(EngineError::new(
            "ConfigurationError",
            "no crew engine configured and the `http` feature is disabled",
        ))
    }
}

async fn execute(
    request: &WorkflowRequest,
    engine: Result<&dyn CrewEngine, EngineError>,
    sink: &dyn EventSink,
    clock: RunClock,
) -> WorkflowResult {
    let run_id = Uuid::new_v4();
    let span = run_span(&run_id, &request.model);

    async move {
        let timer = RunTimer::start();
        sink.emit(
            events::WORKFLOW_STARTED,
            Some(serde_json::json!({
                "run_id": run_id,
                "model": request.model,
                "interactive": request.interactive,
            })),
        )
        .await;

        let (records, engine_result) = match engine {
            Ok(engine) => match build_crew(&request.user_input, request.interactive) {
                Ok(crew) => {
                    info!(stages = crew.plan.stage_count(), "starting crew");
                    let run = engine.kickoff(&crew).await;
                    (run.records, run.result)
                }
                Err(err) => (Vec::new(), Err(EngineError::from(err))),
            },
            Err(err) => (Vec::new(), Err(err)),
        };

        let raw_outputs = extract_safe(&records);
        let outputs = raw_outputs.resolved();

        let success = engine_result.is_ok();
        let (raw_result, mut error) = match engine_result {
            Ok(final_output) => (Some(final_output), None),
            Err(err) => {
                warn!(error = %err, "workflow error; continuing with partial outputs");
                (None, Some(err.to_string()))
            }
        };

        let html_content = match render_sections(&outputs) {
            Ok(sections) => html_document(&clock.run, &clock.display, &sections),
            Err(err) => {
                warn!(error = %err, "HTML generation failed");
                error = Some(format!("HTML generation failed: {err}"));
                String::new()
            }
        };

        let completed = raw_outputs.found().len();
        let duration_ms = timer.elapsed_ms();
        if success {
            sink.emit(
                events::WORKFLOW_COMPLETED,
                Some(serde_json::json!({
                    "run_id": run_id,
                    "completed_stages": completed,
                    "duration_ms": duration_ms,
                })),
            )
            .await;
        } else {
            sink.emit(
                events::WORKFLOW_FAILED,
                Some(serde_json::json!({
                    "run_id": run_id,
                    "completed_stages": completed,
                    "duration_ms": duration_ms,
                    "error": error,
                })),
            )
            .await;
        }
        info!(success, completed, duration_ms, "workflow finished");

        WorkflowResult {
            run_id,
            success,
            user_input: request.user_input.clone(),
            outputs,
            raw_outputs,
            html_content,
            timestamp: clock.run,
            generated_at: clock.display,
            error,
            raw_result,
            records,
        }
    }
    .instrument(span)
    .await
}
