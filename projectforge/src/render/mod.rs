//! Report rendering.
//!
//! Stage outputs are markdown. They are converted to HTML fragments one
//! section at a time, then either assembled into a styled document
//! ([`html_document`]) or concatenated as plain text ([`text_report`]).

mod markdown;
mod sections;
mod template;
mod text;

pub use markdown::markdown_to_html;
pub use sections::{SectionMeta, SECTIONS};
pub use template::html_document;
pub use text::text_report;

use crate::core::RoleKey;
use crate::errors::RenderError;
use crate::extract::ExtractedOutputs;
use std::collections::BTreeMap;

/// Rendered HTML fragment for each report section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHtml {
    fragments: BTreeMap<RoleKey, String>,
}

impl SectionHtml {
    /// Returns the fragment for a section, or an empty string.
    #[must_use]
    pub fn get(&self, key: RoleKey) -> &str {
        self.fragments.get(&key).map_or("", String::as_str)
    }

    fn total_len(&self) -> usize {
        self.fragments.values().map(String::len).sum()
    }
}

/// Converts every section's text to HTML.
///
/// Absent or empty sections are rendered from the incomplete sentinel.
///
/// # Errors
///
/// Returns the first conversion failure, tagged with its section.
pub fn render_sections(outputs: &ExtractedOutputs) -> Result<SectionHtml, RenderError> {
    let fragments = RoleKey::ALL
        .into_iter()
        .map(|key| {
            markdown_to_html(outputs.text_or_sentinel(key))
                .map(|html| (key, html))
                .map_err(|e| e.in_section(key))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(SectionHtml { fragments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_outputs;

    #[test]
    fn test_render_sections_covers_every_key() {
        let sections = render_sections(&sample_outputs()).unwrap();
        for key in RoleKey::ALL {
            assert!(!sections.get(key).is_empty(), "{key}");
        }
        assert!(sections.get(RoleKey::Intake).contains("<strong>Trip logging</strong>"));
    }
}
