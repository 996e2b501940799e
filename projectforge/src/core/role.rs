//! Role registry: the five crew roles and their short output keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Short key identifying one of the five crew roles.
///
/// Variants are declared in pipeline order, so ordered collections keyed by
/// `RoleKey` iterate intake → architect → quality → synthesis → manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKey {
    /// Requirements Intake Specialist.
    Intake,
    /// Technical Architect.
    Architect,
    /// Senior Quality Auditor.
    Quality,
    /// Technical Synthesizer.
    Synthesis,
    /// Project Manager.
    Manager,
}

/// Registry of role-name fragments to keys, in lookup order.
pub const ROLE_REGISTRY: [(&str, RoleKey); 5] = [
    ("Requirements Intake Specialist", RoleKey::Intake),
    ("Technical Architect", RoleKey::Architect),
    ("Senior Quality Auditor", RoleKey::Quality),
    ("Technical Synthesizer", RoleKey::Synthesis),
    ("Project Manager", RoleKey::Manager),
];

impl RoleKey {
    /// All keys in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Intake,
        Self::Architect,
        Self::Quality,
        Self::Synthesis,
        Self::Manager,
    ];

    /// Returns the short key string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Architect => "architect",
            Self::Quality => "quality",
            Self::Synthesis => "synthesis",
            Self::Manager => "manager",
        }
    }

    /// Returns the canonical role name registered for this key.
    #[must_use]
    pub const fn role_name(&self) -> &'static str {
        match self {
            Self::Intake => ROLE_REGISTRY[0].0,
            Self::Architect => ROLE_REGISTRY[1].0,
            Self::Quality => ROLE_REGISTRY[2].0,
            Self::Synthesis => ROLE_REGISTRY[3].0,
            Self::Manager => ROLE_REGISTRY[4].0,
        }
    }

    /// Resolves a free-text role label to a key.
    ///
    /// The first registry entry whose role name is contained anywhere in
    /// `role` wins, so "Lead Technical Architect (backend)" maps to
    /// [`RoleKey::Architect`].
    #[must_use]
    pub fn from_role_name(role: &str) -> Option<Self> {
        ROLE_REGISTRY
            .iter()
            .find(|(name, _)| role.contains(name))
            .map(|(_, key)| *key)
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown role key '{s}'"))
    }
}
