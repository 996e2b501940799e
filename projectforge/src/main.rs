//! ProjectForge CLI.
//!
//! Asks for a project idea, runs the five-agent analysis and writes
//! `output_<timestamp>.{txt,html,pdf}`. The process exits non-zero only
//! when the report files cannot be written; unreadable configuration or
//! prompts fall back to defaults.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use projectforge::config::ForgeConfig;
use projectforge::core::RoleKey;
use projectforge::engine::FeedbackSource;
use projectforge::events::LoggingEventSink;
use projectforge::export::{save_html_output, save_text_output, OutputPaths, PdfExporter};
use projectforge::observability::init_tracing;
use projectforge::runner::{Workflow, WorkflowRequest, WorkflowResult};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{warn, Level};

const DEFAULT_IDEA: &str =
    "We need a carbon tracking app with car trip logging and Google Login.";

const RULE: &str = "============================================================";

#[derive(Parser)]
#[command(name = "projectforge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI business analyst: turns a project idea into a technical plan", long_about = None)]
struct Cli {
    /// Project description (prompted for when omitted)
    #[arg(short, long)]
    description: Option<String>,

    /// Ask for feedback after each agent (prompted for when omitted)
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true", value_name = "BOOL")]
    interactive: Option<bool>,

    /// Model identifier, e.g. gemini/gemini-2.5-flash
    #[arg(long, env = "LLM_MODEL")]
    model: Option<String>,

    /// API key for the model provider
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory for output files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// HTML to PDF converter command
    #[arg(long)]
    pdf_converter: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

/// Reads one trimmed line from stdin after printing `prompt`.
async fn prompt_line(prompt: String) -> Result<String> {
    tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .context("stdin reader stopped unexpectedly")?
    .context("failed to read from stdin")
}

/// Human feedback from the terminal.
struct StdinFeedback;

#[async_trait]
impl FeedbackSource for StdinFeedback {
    async fn feedback(&self, stage: RoleKey, output: &str) -> Option<String> {
        println!("\n{RULE}\n  {} finished\n{RULE}\n{output}\n", stage.role_name());
        let prompt = "Feedback for this agent (press Enter to accept):\n> ".to_string();
        match prompt_line(prompt).await {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "could not read feedback; accepting output");
                None
            }
        }
    }
}

async fn read_description(flag: Option<String>) -> String {
    if let Some(text) = flag.filter(|t| !t.trim().is_empty()) {
        return text.trim().to_string();
    }
    println!("Describe your project idea:");
    println!("(You can include features, constraints, or just a general concept)\n");
    let text = prompt_line("> ".to_string()).await.unwrap_or_else(|err| {
        warn!(error = %err, "could not read project description");
        String::new()
    });
    if text.is_empty() {
        println!("Using default: {DEFAULT_IDEA}");
        return DEFAULT_IDEA.to_string();
    }
    text
}

async fn read_interactive(flag: Option<bool>) -> bool {
    if let Some(value) = flag {
        return value;
    }
    println!("\nDo you want to enable Iterative Mode to provide feedback between agents? (y/n)");
    match prompt_line("> ".to_string()).await {
        Ok(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
        Err(err) => {
            warn!(error = %err, "could not read mode choice; running without feedback");
            false
        }
    }
}

async fn save_outputs(config: &ForgeConfig, result: &WorkflowResult) -> Result<(OutputPaths, bool)> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let paths = OutputPaths::for_timestamp(&config.output_dir, &result.timestamp);
    save_text_output(&paths.text, &result.text_report()).await?;
    save_html_output(&paths.html, &result.html_content).await?;

    let pdf_saved = PdfExporter::new(config.pdf_converter.clone())
        .save_pdf_output(&paths.pdf, &result.html_content)
        .await;
    Ok((paths, pdf_saved))
}

fn print_summary(result: &WorkflowResult, paths: &OutputPaths, pdf_saved: bool) {
    println!("\n{RULE}");
    if result.error.is_some() {
        println!("  WARNING: PARTIAL OUTPUT SAVED");
    } else {
        println!("  OUTPUT SAVED");
    }
    println!("{RULE}");
    println!("   Plain text: {}", paths.text.display());
    println!("   HTML: {}", paths.html.display());
    if pdf_saved {
        println!("   PDF: {}", paths.pdf.display());
    }
    println!("{RULE}\n");
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let mut config = ForgeConfig::from_env_lenient();
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    if let Some(key) = cli.api_key {
        config = config.with_api_key(key);
    }
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(converter) = cli.pdf_converter {
        config = config.with_pdf_converter(converter);
    }

    println!("\n{RULE}\n   PROJECTFORGE - AI Business Analyst\n{RULE}\n");
    let user_input = read_description(cli.description).await;
    let interactive = read_interactive(cli.interactive).await;

    let request = WorkflowRequest::new(
        user_input,
        config.model.clone(),
        config.api_key.clone().unwrap_or_default(),
    )
    .with_interactive(interactive);

    let workflow = Workflow::new(config.clone())
        .with_event_sink(Arc::new(LoggingEventSink::default()))
        .with_feedback(Arc::new(StdinFeedback));

    println!("\n### ProjectForge: Initiating Full Analysis Workflow ###\n");
    let result = workflow.run(&request).await;

    match (&result.raw_result, &result.error) {
        (Some(plan), None) => {
            println!("\n\n{RULE}\n  FINAL PROJECT PLAN\n{RULE}\n");
            println!("{plan}");
        }
        (_, Some(error)) => {
            println!("\nWARNING: WORKFLOW ERROR: {error}");
            println!("Attempting to save partial results...\n");
        }
        (None, None) => {}
    }

    let (paths, pdf_saved) = save_outputs(&config, &result)
        .await
        .context("CRITICAL: failed to save outputs")?;
    print_summary(&result, &paths, pdf_saved);

    if result.error.is_some() {
        println!("\nWARNING: Workflow did not complete successfully.");
        println!("Partial results have been saved to output files.\n");
    }
    Ok(())
}
