//! Plain-text report.

use super::SECTIONS;
use crate::extract::ExtractedOutputs;
use std::fmt::Write;

/// Width of the rule under the report header.
const RULE_WIDTH: usize = 80;

/// Renders the plain-text report.
///
/// Sections always appear in report order, whatever order the outputs were
/// produced in. Missing sections show the incomplete sentinel.
#[must_use]
pub fn text_report(user_input: &str, generated_at: &str, outputs: &ExtractedOutputs) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "ProjectForge Analysis\nGenerated: {generated_at}\nProject: {user_input}\n{}\n\n",
        "=".repeat(RULE_WIDTH)
    );

    let last = SECTIONS.len() - 1;
    for (i, section) in SECTIONS.iter().enumerate() {
        let body = outputs.text_or_sentinel(section.key);
        let gap = if i == last { "\n" } else { "\n\n" };
        let _ = write!(out, "## {}\n\n{body}{gap}", section.text_heading);
    }
    out
}
