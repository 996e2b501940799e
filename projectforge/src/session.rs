//! In-memory report downloads.
//!
//! For front-ends that serve the report instead of writing it to disk: each
//! format is a [`Download`] with its file name, MIME type and bytes.

use crate::export::PdfExporter;
use crate::runner::WorkflowResult;
use serde::Serialize;

/// MIME type of the text report.
pub const TEXT_MIME: &str = "text/plain";
/// MIME type of the HTML report.
pub const HTML_MIME: &str = "text/html";
/// MIME type of the PDF report.
pub const PDF_MIME: &str = "application/pdf";

/// One downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type.
    pub mime: &'static str,
    /// File contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Download {
    fn new(file_name: String, mime: &'static str, bytes: Vec<u8>) -> Self {
        Self { file_name, mime, bytes }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Every format of one run's report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    /// Plain-text report.
    pub text: Download,
    /// HTML report.
    pub html: Download,
    /// PDF report, if the converter succeeded.
    pub pdf: Option<Download>,
}

impl ReportBundle {
    /// Builds the downloads for `result`. PDF conversion failure leaves
    /// [`ReportBundle::pdf`] empty and is otherwise ignored.
    pub async fn from_result(result: &WorkflowResult, pdf: &PdfExporter) -> Self {
        let name = |ext: &str| format!("output_{}.{ext}", result.timestamp);

        let text = Download::new(name("txt"), TEXT_MIME, result.text_report().into_bytes());
        let html = Download::new(name("html"), HTML_MIME, result.html_content.clone().into_bytes());
        let pdf = pdf
            .pdf_bytes(&result.html_content)
            .await
            .map(|bytes| Download::new(name("pdf"), PDF_MIME, bytes));

        Self { text, html, pdf }
    }

    /// Downloads that are available, text first.
    pub fn downloads(&self) -> impl Iterator<Item = &Download> {
        [Some(&self.text), Some(&self.html), self.pdf.as_ref()]
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SequentialCrew;
    use crate::runner::{run_analysis_workflow, WorkflowRequest};
    use crate::testing::ScriptedProvider;
    use std::sync::Arc;

    async fn result() -> WorkflowResult {
        let engine = SequentialCrew::new(Arc::new(ScriptedProvider::new()), "m");
        run_analysis_workflow(&WorkflowRequest::new("idea", "gemini/x", "key"), &engine).await
    }

    #[tokio::test]
    async fn test_bundle_without_pdf() {
        let result = result().await;
        let bundle = ReportBundle::from_result(&result, &PdfExporter::new("projectforge-test-missing")).await;

        assert_eq!(bundle.text.file_name, format!("output_{}.txt", result.timestamp));
        assert_eq!(bundle.text.mime, "text/plain");
        assert_eq!(bundle.html.mime, "text/html");
        assert_eq!(bundle.html.bytes, result.html_content.as_bytes());
        assert!(String::from_utf8_lossy(&bundle.text.bytes).starts_with("ProjectForge Analysis\n"));
        assert!(bundle.pdf.is_none());
        assert_eq!(bundle.downloads().count(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bundle_with_pdf() {
        let result = result().await;
        let exporter = PdfExporter::new("cat").with_args(Vec::<String>::new());
        let bundle = ReportBundle::from_result(&result, &exporter).await;

        let pdf = bundle.pdf.as_ref().unwrap();
        assert_eq!(pdf.mime, "application/pdf");
        assert!(pdf.file_name.ends_with(".pdf"));
        assert!(!pdf.is_empty());
        assert_eq!(bundle.downloads().count(), 3);
    }
}
