//! Report section layout shared by the HTML and text renderers.

use crate::core::RoleKey;

/// Presentation data for one report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMeta {
    /// Output key rendered in this section.
    pub key: RoleKey,
    /// CSS class suffix of the badge (`badge-<class>`).
    pub badge_class: &'static str,
    /// Badge label.
    pub badge: &'static str,
    /// HTML section title.
    pub html_title: &'static str,
    /// Heading used in the plain-text report.
    pub text_heading: &'static str,
}

/// Sections in report order.
pub const SECTIONS: [SectionMeta; 5] = [
    SectionMeta {
        key: RoleKey::Intake,
        badge_class: "ba",
        badge: "BA",
        html_title: "Business Requirements",
        text_heading: "Business Requirements",
    },
    SectionMeta {
        key: RoleKey::Architect,
        badge_class: "architect",
        badge: "Architect",
        html_title: "Technical Design",
        text_heading: "Technical Design",
    },
    SectionMeta {
        key: RoleKey::Quality,
        badge_class: "qa",
        badge: "QA",
        html_title: "Risk Assessment",
        text_heading: "Risk Assessment",
    },
    SectionMeta {
        key: RoleKey::Synthesis,
        badge_class: "synthesis",
        badge: "Synthesis",
        html_title: "Technical Summary",
        text_heading: "Technical Synthesis",
    },
    SectionMeta {
        key: RoleKey::Manager,
        badge_class: "pm",
        badge: "PM",
        html_title: "Executive Summary &amp; Roadmap",
        text_heading: "Executive Summary & Roadmap",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_follow_pipeline_order() {
        let keys: Vec<RoleKey> = SECTIONS.iter().map(|s| s.key).collect();
        assert_eq!(keys, RoleKey::ALL.to_vec());
    }
}
