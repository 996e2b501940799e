//! Styled HTML report document.

use super::{SectionHtml, SECTIONS};
use std::fmt::Write;

const STYLE: &str = r"
        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            line-height: 1.6;
            color: #333;
            background: #f5f5f5;
            padding: 20px;
        }

        .container {
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }

        h1 {
            color: #1a73e8;
            border-bottom: 3px solid #1a73e8;
            padding-bottom: 10px;
            margin-bottom: 30px;
        }

        .timestamp {
            color: #666;
            font-size: 14px;
            margin-bottom: 30px;
        }

        .section {
            margin-bottom: 30px;
            border: 1px solid #e0e0e0;
            border-radius: 8px;
            overflow: hidden;
        }

        .section-header {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 15px 20px;
            cursor: pointer;
            display: flex;
            justify-content: space-between;
            align-items: center;
            user-select: none;
        }

        .section-header:hover {
            background: linear-gradient(135deg, #5568d3 0%, #65408b 100%);
        }

        .section-header h2 {
            margin: 0;
            font-size: 20px;
        }

        .toggle-icon {
            font-size: 24px;
            transition: transform 0.3s;
        }

        .section-header.collapsed .toggle-icon {
            transform: rotate(-90deg);
        }

        .section-content {
            padding: 20px;
            background: #fafafa;
            max-height: 5000px;
            overflow: hidden;
            transition: max-height 0.3s ease-out, padding 0.3s;
        }

        .section-content.collapsed {
            max-height: 0;
            padding: 0 20px;
        }

        .section-content h3 {
            color: #667eea;
            margin-top: 20px;
            margin-bottom: 10px;
        }

        .section-content h4 {
            color: #764ba2;
            margin-top: 15px;
            margin-bottom: 8px;
        }

        .section-content ul {
            margin-left: 20px;
            margin-bottom: 15px;
        }

        .section-content li {
            margin-bottom: 8px;
        }

        .section-content p {
            margin-bottom: 15px;
        }

        .section-content table {
            width: 100%;
            border-collapse: collapse;
            margin: 15px 0;
            background: white;
            box-shadow: 0 1px 3px rgba(0,0,0,0.1);
            overflow-x: auto;
            display: block;
        }

        .section-content th {
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            color: white;
            padding: 12px;
            text-align: left;
            font-weight: 600;
        }

        .section-content td {
            padding: 10px 12px;
            border-bottom: 1px solid #e0e0e0;
        }

        .section-content tr:last-child td {
            border-bottom: none;
        }

        .section-content tr:hover {
            background: #f5f5f5;
        }

        .section-content code {
            background: #f4f4f4;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: 'Monaco', 'Courier New', monospace;
            font-size: 0.9em;
            color: #d63384;
        }

        .section-content pre {
            background: #2d2d2d;
            color: #f8f8f2;
            padding: 15px;
            border-radius: 5px;
            overflow-x: auto;
            margin: 15px 0;
        }

        .section-content pre code {
            background: transparent;
            padding: 0;
            color: inherit;
            font-size: 0.9em;
        }

        .badge {
            display: inline-block;
            padding: 4px 12px;
            border-radius: 12px;
            font-size: 12px;
            font-weight: 600;
            margin-right: 8px;
        }

        .badge-ba { background: #e3f2fd; color: #1976d2; }
        .badge-architect { background: #f3e5f5; color: #7b1fa2; }
        .badge-qa { background: #fff3e0; color: #e65100; }
        .badge-synthesis { background: #f3e5f5; color: #6a1b9a; }
        .badge-pm { background: #e8f5e9; color: #2e7d32; }
";

const SCRIPT: &str = r"
        function toggleSection(header) {
            const content = header.nextElementSibling;
            header.classList.toggle('collapsed');
            content.classList.toggle('collapsed');
        }
";

/// Assembles the full report document.
///
/// The output depends only on the arguments, so identical inputs give
/// byte-identical documents.
#[must_use]
pub fn html_document(run_timestamp: &str, generated_at: &str, sections: &SectionHtml) -> String {
    let mut out = String::with_capacity(STYLE.len() + sections.total_len() + 4096);

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
         <title>ProjectForge Analysis - {run_timestamp}</title>\n    <style>{STYLE}    </style>\n\
         </head>\n<body>\n    <div class=\"container\">\n        <h1>ProjectForge Analysis</h1>\n        \
         <div class=\"timestamp\">Generated: {generated_at}</div>\n"
    );

    for meta in &SECTIONS {
        let _ = write!(
            out,
            "\n        <div class=\"section\">\n            \
             <div class=\"section-header\" onclick=\"toggleSection(this)\">\n                \
             <h2><span class=\"badge badge-{class}\">{badge}</span>{title}</h2>\n                \
             <span class=\"toggle-icon\">\u{25bc}</span>\n            </div>\n            \
             <div class=\"section-content\">\n{content}\n            </div>\n        </div>\n",
            class = meta.badge_class,
            badge = meta.badge,
            title = meta.html_title,
            content = sections.get(meta.key),
        );
    }

    let _ = write!(
        out,
        "    </div>\n\n    <script>{SCRIPT}    </script>\n</body>\n</html>\n"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RoleKey;
    use crate::render::render_sections;
    use crate::testing::sample_outputs;

    fn document() -> String {
        let sections = render_sections(&sample_outputs().resolved()).unwrap();
        html_document("20250114_210509", "January 14, 2025 at 09:05 PM", &sections)
    }

    #[test]
    fn test_title_and_generated_line() {
        let html = document();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>ProjectForge Analysis - 20250114_210509</title>"));
        assert!(html.contains("Generated: January 14, 2025 at 09:05 PM"));
    }

    #[test]
    fn test_five_collapsible_sections_in_order() {
        let html = document();
        assert_eq!(html.matches("class=\"section-header\" onclick=\"toggleSection(this)\"").count(), 5);
        assert_eq!(html.matches("class=\"toggle-icon\">\u{25bc}</span>").count(), 5);
        assert!(html.contains("function toggleSection(header)"));

        let positions: Vec<usize> = [
            "badge-ba\">BA</span>Business Requirements",
            "badge-architect\">Architect</span>Technical Design",
            "badge-qa\">QA</span>Risk Assessment",
            "badge-synthesis\">Synthesis</span>Technical Summary",
            "badge-pm\">PM</span>Executive Summary &amp; Roadmap",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_section_bodies_are_rendered_markdown() {
        let html = document();
        assert!(html.contains("<h2>Roadmap</h2>"));
        assert!(html.contains("<code>PostgreSQL</code>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_key_styles_present() {
        let html = document();
        for rule in ["max-width: 1200px", "color: #1a73e8", "#667eea 0%, #764ba2 100%", "color: #d63384", "background: #2d2d2d"] {
            assert!(html.contains(rule), "missing {rule}");
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        assert_eq!(document(), document());
    }

    #[test]
    fn test_sentinel_sections() {
        let sections = render_sections(&crate::extract::ExtractedOutputs::empty().resolved()).unwrap();
        let html = html_document("ts", "now", &sections);
        assert_eq!(html.matches("<p>[Task did not complete]</p>").count(), 5);
        assert!(sections.get(RoleKey::Quality).contains("[Task did not complete]"));
    }
}
