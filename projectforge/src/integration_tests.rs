//! End-to-end runs: engine, extraction, rendering and export together.

#[cfg(test)]
mod tests {
    use crate::core::{RoleKey, StageStatus};
    use crate::engine::{JitterStrategy, RetryConfig, SequentialCrew};
    use crate::errors::LlmError;
    use crate::export::{save_html_output, save_text_output, OutputPaths, PdfExporter};
    use crate::extract::INCOMPLETE_SENTINEL;
    use crate::runner::{run_analysis_workflow, WorkflowRequest, WorkflowResult};
    use crate::testing::ScriptedProvider;
    use pretty_assertions::assert_eq;
    use regex::Regex;
    use std::sync::Arc;

    const MISSING_CONVERTER: &str = "projectforge-test-no-such-converter";

    fn request() -> WorkflowRequest {
        WorkflowRequest::new(
            "We need a carbon tracking app with car trip logging and Google Login.",
            "gemini/gemini-2.5-flash",
            "test-key",
        )
    }

    async fn run_with(provider: ScriptedProvider) -> (WorkflowResult, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let engine = SequentialCrew::new(provider.clone(), "gemini-2.5-flash").with_retry(
            RetryConfig::new()
                .with_max_attempts(2)
                .with_base_delay_ms(1)
                .with_jitter(JitterStrategy::None),
        );
        (run_analysis_workflow(&request(), &engine).await, provider)
    }

    /// Replaces the live timestamps so documents from two runs compare equal.
    fn scrub(text: &str) -> String {
        let run_ts = Regex::new(r"\d{8}_\d{6}").unwrap();
        let display = Regex::new(r"[A-Z][a-z]+ \d{2}, \d{4} at \d{2}:\d{2} [AP]M").unwrap();
        let text = run_ts.replace_all(text, "<ts>");
        display.replace_all(&text, "<generated>").into_owned()
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let (result, provider) = run_with(ScriptedProvider::new()).await;

        assert!(result.success);
        assert_eq!(result.error, None);
        assert_eq!(result.raw_result.as_deref(), Some("manager output"));
        assert_eq!(provider.call_count(), 5);
        for key in RoleKey::ALL {
            assert_eq!(result.outputs.get(key), Some(format!("{key} output").as_str()));
        }
        assert!(Regex::new(r"^\d{8}_\d{6}$").unwrap().is_match(&result.timestamp));
        assert!(result
            .html_content
            .contains(&format!("<title>ProjectForge Analysis - {}</title>", result.timestamp)));

        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_timestamp(dir.path(), &result.timestamp);
        save_text_output(&paths.text, &result.text_report()).await.unwrap();
        save_html_output(&paths.html, &result.html_content).await.unwrap();

        let text = std::fs::read_to_string(&paths.text).unwrap();
        assert!(text.contains("Project: We need a carbon tracking app"));
        assert!(text.contains("## Risk Assessment\n\nquality output\n\n"));
        assert_eq!(std::fs::read_to_string(&paths.html).unwrap(), result.html_content);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_all_exports_producible() {
        let (result, _) = run_with(ScriptedProvider::new()).await;
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_timestamp(dir.path(), &result.timestamp);

        let exporter = PdfExporter::new("cat").with_args(Vec::<String>::new());
        assert!(exporter.save_pdf_output(&paths.pdf, &result.html_content).await);
        assert!(paths.pdf.exists());
    }

    #[tokio::test]
    async fn test_engine_fails_after_second_stage() {
        let provider = ScriptedProvider::new()
            .fail_on_call(3, LlmError::Api { status: 400, message: "context window exceeded".into() });
        let (result, _) = run_with(provider).await;

        assert!(!result.success);
        let error = result.error.clone().unwrap();
        assert!(error.starts_with("APIError: "), "{error}");
        assert!(error.contains("context window exceeded"));
        assert_eq!(result.raw_result, None);

        assert_eq!(result.outputs.get(RoleKey::Intake), Some("intake output"));
        assert_eq!(result.outputs.get(RoleKey::Architect), Some("architect output"));
        for key in [RoleKey::Quality, RoleKey::Synthesis, RoleKey::Manager] {
            assert_eq!(result.outputs.get(key), Some(INCOMPLETE_SENTINEL));
            assert_eq!(result.raw_outputs.get(key), None);
        }

        let statuses: Vec<StageStatus> = result.records.iter().map(|r| r.outcome.status()).collect();
        assert_eq!(statuses[2], StageStatus::Failed);
        assert_eq!(statuses[4], StageStatus::NotRun);

        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_timestamp(dir.path(), &result.timestamp);
        save_text_output(&paths.text, &result.text_report()).await.unwrap();
        save_html_output(&paths.html, &result.html_content).await.unwrap();

        let text = std::fs::read_to_string(&paths.text).unwrap();
        assert_eq!(text.matches(INCOMPLETE_SENTINEL).count(), 3);
        assert_eq!(result.html_content.matches("<p>[Task did not complete]</p>").count(), 3);
    }

    #[tokio::test]
    async fn test_pdf_converter_unavailable() {
        let (result, _) = run_with(ScriptedProvider::new()).await;
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_timestamp(dir.path(), &result.timestamp);

        let exporter = PdfExporter::new(MISSING_CONVERTER);
        assert_eq!(exporter.pdf_bytes(&result.html_content).await, None);
        assert!(!exporter.save_pdf_output(&paths.pdf, &result.html_content).await);

        save_text_output(&paths.text, &result.text_report()).await.unwrap();
        save_html_output(&paths.html, &result.html_content).await.unwrap();
        assert!(paths.text.exists());
        assert!(paths.html.exists());
        assert!(!paths.pdf.exists());
    }

    #[tokio::test]
    async fn test_identical_runs_render_identically() {
        let (first, _) = run_with(ScriptedProvider::new()).await;
        let (second, _) = run_with(ScriptedProvider::new()).await;

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(scrub(&first.html_content), scrub(&second.html_content));
        assert_eq!(scrub(&first.text_report()), scrub(&second.text_report()));
    }
}
