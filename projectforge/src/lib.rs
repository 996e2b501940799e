//! # ProjectForge
//!
//! Turns a free-text project idea into a business and technical report by
//! running five LLM agents in sequence, then renders the report as plain
//! text, HTML and PDF.
//!
//! - **Pipeline**: five agent personas and five stages with context edges,
//!   validated into an ordered plan
//! - **Engine**: a sequential crew over any [`llm::LlmProvider`], with
//!   retry and optional human feedback
//! - **Extraction**: stage records are mapped back to roles by name, and a
//!   failed run still yields every section (missing ones as a sentinel)
//! - **Rendering and export**: markdown to a styled HTML report, text report,
//!   PDF through an external converter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use projectforge::prelude::*;
//!
//! let workflow = Workflow::new(ForgeConfig::from_env()?);
//! let request = WorkflowRequest::new(
//!     "A carbon tracking app with trip logging",
//!     "gemini/gemini-2.5-flash",
//!     api_key,
//! );
//! let result = workflow.run(&request).await;
//! println!("{}", result.text_report());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod export;
pub mod extract;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod runner;
pub mod session;
pub mod testing;
pub mod utils;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ForgeConfig;
    pub use crate::core::{RoleKey, StageOutcome, StageStatus, TaskRecord};
    pub use crate::engine::{CrewEngine, CrewRun, FeedbackSource, RetryConfig, SequentialCrew};
    pub use crate::errors::{
        EngineError, ExportError, ForgeError, LlmError, MissingRolesError,
        PipelineValidationError, RenderError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::export::{save_html_output, save_text_output, OutputPaths, PdfExporter};
    pub use crate::extract::{extract_by_role, extract_safe, ExtractedOutputs, INCOMPLETE_SENTINEL};
    pub use crate::llm::{ChatMessage, ChatRequest, LlmProvider, LlmResponse, ModelId};
    pub use crate::pipeline::{build_crew, Crew, PipelineBuilder, StagePlan, StageSpec};
    pub use crate::render::{html_document, markdown_to_html, render_sections, text_report};
    pub use crate::runner::{run_analysis_workflow, Workflow, WorkflowRequest, WorkflowResult};
    pub use crate::session::{Download, ReportBundle};
}
