//! HTML to PDF through an external converter process.

use crate::errors::PdfError;
use futures::future;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::warn;

/// Converter used when none is configured.
pub const DEFAULT_PDF_CONVERTER: &str = "wkhtmltopdf";

/// Converts HTML to PDF by piping it through a converter command.
///
/// The converter reads HTML on stdin and writes PDF on stdout. For
/// `wkhtmltopdf` that is `wkhtmltopdf --quiet - -`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExporter {
    converter: String,
    args: Vec<String>,
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new(DEFAULT_PDF_CONVERTER)
    }
}

impl PdfExporter {
    /// Creates an exporter for `converter` with the stdin/stdout arguments
    /// `wkhtmltopdf` expects.
    #[must_use]
    pub fn new(converter: impl Into<String>) -> Self {
        Self {
            converter: converter.into(),
            args: vec!["--quiet".into(), "-".into(), "-".into()],
        }
    }

    /// Replaces the converter arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the converter command.
    #[must_use]
    pub fn converter(&self) -> &str {
        &self.converter
    }

    /// Runs the converter.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the converter is missing, fails, or writes
    /// nothing.
    pub async fn convert(&self, html: &str) -> Result<Vec<u8>, PdfError> {
        let mut child = Command::new(&self.converter)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PdfError::ConverterMissing(self.converter.clone()),
                _ => PdfError::Io(e),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PdfError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "converter stdin unavailable")))?;
        let input = html.as_bytes().to_vec();
        let feed = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };

        let (fed, output) = future::join(feed, child.wait_with_output()).await;
        let output = output?;

        if !output.status.success() {
            return Err(PdfError::ConverterFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(err) = fed {
            tracing::debug!(error = %err, "converter closed stdin before reading all input");
        }
        if output.stdout.is_empty() {
            return Err(PdfError::EmptyOutput);
        }
        Ok(output.stdout)
    }

    /// Renders a PDF in memory. Logs a warning and returns `None` on failure.
    pub async fn pdf_bytes(&self, html: &str) -> Option<Vec<u8>> {
        match self.convert(html).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(converter = %self.converter, error = %err, "PDF generation failed");
                None
            }
        }
    }

    /// Renders a PDF to `path`. Logs a warning and returns `false` on failure.
    pub async fn save_pdf_output(&self, path: impl AsRef<Path>, html: &str) -> bool {
        let path = path.as_ref();
        let Some(bytes) = self.pdf_bytes(html).await else {
            return false;
        };
        match tokio::fs::write(path, &bytes).await {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to write PDF");
                false
            }
        }
    }
}
