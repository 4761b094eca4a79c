//! Contextual facts of a single evaluation
//!
//! Facts are derived once per evaluation and never mutated afterwards.
//! They feed both the escalator and the rule evaluator.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable facts about when and under what circumstances a change-set is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFacts {
    /// Instant of evaluation
    pub evaluation_time: DateTime<Utc>,

    /// Addresses present both in the drift scan and in the change-set
    pub drift_conflicts: BTreeSet<String>,

    /// Declared intent, usually a commit message
    pub declared_intent: Option<String>,

    /// Break-glass override requested
    pub emergency_override: bool,

    /// Free-text reason for the override, such as an incident id
    pub override_reason: Option<String>,

    /// Planning tool version that produced the change-set
    pub tool_version: String,

    /// Planning tool version of the last apply, when known
    pub prior_applied_version: Option<String>,

    /// Tool version differs from the last applied version
    pub tool_version_skew: bool,

    /// Why the evaluation time is sensitive, if it is
    pub sensitive_window: Option<String>,

    /// Whether a drift scan was supplied at all
    pub drift_scan_supplied: bool,
}

impl ContextFacts {
    /// Facts with no drift, no intent, no override and no skew.
    pub fn new(evaluation_time: DateTime<Utc>, tool_version: impl Into<String>) -> Self {
        Self {
            evaluation_time,
            drift_conflicts: BTreeSet::new(),
            declared_intent: None,
            emergency_override: false,
            override_reason: None,
            tool_version: tool_version.into(),
            prior_applied_version: None,
            tool_version_skew: false,
            sensitive_window: None,
            drift_scan_supplied: false,
        }
    }

    pub fn with_drift_conflicts<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drift_conflicts = addresses.into_iter().map(Into::into).collect();
        self.drift_scan_supplied = true;
        self
    }

    pub fn with_declared_intent(mut self, intent: impl Into<String>) -> Self {
        self.declared_intent = Some(intent.into());
        self
    }

    pub fn with_emergency_override(mut self, reason: Option<String>) -> Self {
        self.emergency_override = true;
        self.override_reason = reason;
        self
    }

    /// Record the prior applied version and derive the skew flag.
    pub fn with_prior_applied_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.tool_version_skew = version != self.tool_version;
        self.prior_applied_version = Some(version);
        self
    }

    pub fn with_sensitive_window(mut self, reason: impl Into<String>) -> Self {
        self.sensitive_window = Some(reason.into());
        self
    }

    pub fn has_drift_conflicts(&self) -> bool {
        !self.drift_conflicts.is_empty()
    }

    pub fn in_sensitive_window(&self) -> bool {
        self.sensitive_window.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn prior_version_sets_skew_only_when_different() {
        let at = Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap();
        let same = ContextFacts::new(at, "1.6.2").with_prior_applied_version("1.6.2");
        assert!(!same.tool_version_skew);

        let skewed = ContextFacts::new(at, "1.6.2").with_prior_applied_version("1.5.7");
        assert!(skewed.tool_version_skew);
    }

    #[test]
    fn drift_conflicts_mark_scan_supplied() {
        let at = Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap();
        let facts = ContextFacts::new(at, "1.6.2").with_drift_conflicts(Vec::<String>::new());
        assert!(facts.drift_scan_supplied);
        assert!(!facts.has_drift_conflicts());
    }
}
