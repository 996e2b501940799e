//! Task output extraction.
//!
//! Maps engine [`TaskRecord`]s back to the five role keys. Identity is always
//! re-derived from each record's declared role, never from its position, so
//! a reordered or dropped stage degrades to "missing" instead of attributing
//! output to the wrong section.

use crate::core::{RoleKey, TaskRecord};
use crate::errors::MissingRolesError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder text for sections whose stage produced no output.
pub const INCOMPLETE_SENTINEL: &str = "[Task did not complete]";

/// Extracted stage outputs keyed by role.
///
/// Always holds exactly the five [`RoleKey`]s; a key whose stage produced
/// nothing maps to `None` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedOutputs {
    outputs: BTreeMap<RoleKey, Option<String>>,
}

impl Default for ExtractedOutputs {
    fn default() -> Self {
        Self::empty()
    }
}

impl ExtractedOutputs {
    /// Creates outputs with every key absent.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            outputs: RoleKey::ALL.into_iter().map(|k| (k, None)).collect(),
        }
    }

    /// Sets the output for a key.
    pub fn set(&mut self, key: RoleKey, text: Option<String>) {
        self.outputs.insert(key, text);
    }

    /// Builder-style variant of [`ExtractedOutputs::set`].
    #[must_use]
    pub fn with(mut self, key: RoleKey, text: impl Into<String>) -> Self {
        self.set(key, Some(text.into()));
        self
    }

    /// Returns the output for a key, if present.
    #[must_use]
    pub fn get(&self, key: RoleKey) -> Option<&str> {
        self.outputs.get(&key).and_then(|v| v.as_deref())
    }

    /// Returns the output for a key, or the sentinel when absent or empty.
    #[must_use]
    pub fn text_or_sentinel(&self, key: RoleKey) -> &str {
        match self.get(key) {
            Some(text) if !text.is_empty() => text,
            _ => INCOMPLETE_SENTINEL,
        }
    }

    /// Returns a copy where every absent or empty section holds the sentinel.
    #[must_use]
    pub fn resolved(&self) -> Self {
        Self {
            outputs: RoleKey::ALL
                .into_iter()
                .map(|k| (k, Some(self.text_or_sentinel(k).to_string())))
                .collect(),
        }
    }

    /// Keys that hold output.
    #[must_use]
    pub fn found(&self) -> BTreeSet<RoleKey> {
        self.outputs
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| *k)
            .collect()
    }

    /// Keys with no output.
    #[must_use]
    pub fn missing(&self) -> BTreeSet<RoleKey> {
        self.outputs
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect()
    }

    /// Returns true if every key holds output.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outputs.values().all(Option::is_some)
    }

    /// Iterates keys and outputs in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (RoleKey, Option<&str>)> {
        self.outputs.iter().map(|(k, v)| (*k, v.as_deref()))
    }

    /// Number of keys. Always five.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Never true; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Walks records in order, attributing each to a key by role-name containment.
///
/// Records without an agent or with an unrecognised role are skipped. A
/// record whose output cannot be read stores `None`. Later records for the
/// same key overwrite earlier ones.
fn collect_by_role(records: &[TaskRecord], into: &mut BTreeMap<RoleKey, Option<String>>) {
    for record in records {
        let Some(role) = record.agent_role.as_deref() else {
            continue;
        };
        let Some(key) = RoleKey::from_role_name(role) else {
            tracing::debug!(role, "no registry entry matches agent role");
            continue;
        };
        into.insert(key, record.outcome.output().map(str::to_string));
    }
}

/// Strict extraction: every role must have produced output.
///
/// # Errors
///
/// Returns [`MissingRolesError`] naming the missing and found keys when at
/// least one role has no readable output.
pub fn extract_by_role(records: &[TaskRecord]) -> Result<ExtractedOutputs, MissingRolesError> {
    let mut outputs = BTreeMap::new();
    collect_by_role(records, &mut outputs);

    let found: BTreeSet<RoleKey> = outputs
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(k, _)| *k)
        .collect();
    let missing: BTreeSet<RoleKey> = RoleKey::ALL
        .into_iter()
        .filter(|k| !found.contains(k))
        .collect();

    if !missing.is_empty() {
        return Err(MissingRolesError { missing, found });
    }

    Ok(ExtractedOutputs { outputs })
}

/// Safe extraction: never fails, returns whatever could be recovered.
///
/// Tries [`extract_by_role`] first and falls back to a best-effort pass that
/// starts with every key absent.
#[must_use]
pub fn extract_safe(records: &[TaskRecord]) -> ExtractedOutputs {
    match extract_by_role(records) {
        Ok(outputs) => outputs,
        Err(err) => {
            tracing::debug!(error = %err, "falling back to partial extraction");
            let mut outputs = ExtractedOutputs::empty();
            collect_by_role(records, &mut outputs.outputs);
            outputs
        }
    }
}
