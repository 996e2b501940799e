//! Writing reports to disk.
//!
//! Text and HTML writes are the only unrecoverable failures of a run; PDF
//! conversion is best-effort and reports failure as `None`/`false`.

mod pdf;

pub use pdf::{PdfExporter, DEFAULT_PDF_CONVERTER};

use crate::errors::ExportError;
use std::path::{Path, PathBuf};

/// File names for one run's outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Plain-text report.
    pub text: PathBuf,
    /// HTML report.
    pub html: PathBuf,
    /// PDF report.
    pub pdf: PathBuf,
}

impl OutputPaths {
    /// Paths `output_<ts>.{txt,html,pdf}` inside `dir`.
    #[must_use]
    pub fn for_timestamp(dir: impl AsRef<Path>, timestamp: &str) -> Self {
        let dir = dir.as_ref();
        let file = |ext: &str| dir.join(format!("output_{timestamp}.{ext}"));
        Self {
            text: file("txt"),
            html: file("html"),
            pdf: file("pdf"),
        }
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ExportError::new(path, e))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote report file");
    Ok(())
}

/// Writes the plain-text report.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub async fn save_text_output(path: impl AsRef<Path>, text: &str) -> Result<(), ExportError> {
    write_file(path.as_ref(), text).await
}

/// Writes the HTML report.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be written.
pub async fn save_html_output(path: impl AsRef<Path>, html: &str) -> Result<(), ExportError> {
    write_file(path.as_ref(), html).await
}
