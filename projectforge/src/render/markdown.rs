//! Markdown to HTML conversion.

use crate::errors::RenderError;
use pulldown_cmark::{html, Options, Parser};

/// Converts markdown to an HTML fragment with tables and fenced code blocks.
///
/// Raw HTML in the input is passed through unchanged.
///
/// # Errors
///
/// Returns [`RenderError::Markdown`] if the HTML writer fails.
pub fn markdown_to_html(text: &str) -> Result<String, RenderError> {
    let parser = Parser::new_ext(text, Options::ENABLE_TABLES);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::write_html_fmt(&mut out, parser).map_err(|e| RenderError::Markdown {
        reason: e.to_string(),
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_emphasis() {
        let html = markdown_to_html("## Roadmap\n\n**Sprint 1**").unwrap();
        assert!(html.contains("<h2>Roadmap</h2>"));
        assert!(html.contains("<strong>Sprint 1</strong>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_fenced_code() {
        let html = markdown_to_html("```json\n{\"id\": 1}\n```").unwrap();
        assert!(html.contains("<pre><code class=\"language-json\">"));
        assert!(html.contains("{&quot;id&quot;: 1}"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(markdown_to_html("").unwrap(), "");
    }
}
