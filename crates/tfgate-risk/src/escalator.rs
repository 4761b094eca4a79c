//! Context derivation and tier escalation
//!
//! [`ContextEscalator::derive_facts`] turns raw context sources into
//! immutable [`ContextFacts`]. [`escalate`] raises a classified tier from
//! those facts: one step for a sensitive window, at least RED for drift
//! conflicts. Version skew never escalates.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use tfgate_types::{
    BlastRadiusTier, ChangeSet, ContextFacts, DriftScan, EscalationReason, TierAssessment,
};
use tracing::{debug, warn};

use crate::config::TemporalConfig;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Raw context of one evaluation, before derivation.
#[derive(Debug, Clone)]
pub struct ContextSources {
    pub evaluation_time: DateTime<Utc>,
    /// `None` when no drift scan was supplied
    pub drift: Option<DriftScan>,
    pub declared_intent: Option<String>,
    pub emergency_override: bool,
    pub override_reason: Option<String>,
}

impl ContextSources {
    pub fn at(evaluation_time: DateTime<Utc>) -> Self {
        Self {
            evaluation_time,
            drift: None,
            declared_intent: None,
            emergency_override: false,
            override_reason: None,
        }
    }

    pub fn with_drift(mut self, drift: DriftScan) -> Self {
        self.drift = Some(drift);
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
}

/// Derives context facts from the temporal configuration.
#[derive(Debug, Clone, Default)]
pub struct ContextEscalator {
    temporal: TemporalConfig,
}

impl ContextEscalator {
    pub fn new(temporal: TemporalConfig) -> Self {
        Self { temporal }
    }

    /// Why `at` falls in a sensitive window, or `None` when it does not.
    ///
    /// Multiple simultaneous reasons are joined into one.
    pub fn sensitive_window(&self, at: DateTime<Utc>) -> Option<String> {
        let cfg = &self.temporal;
        let local = match FixedOffset::east_opt(cfg.utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => at.with_timezone(&offset),
            None => at.fixed_offset(),
        };
        let weekday = local.weekday().num_days_from_monday();
        let hour = local.hour();
        let day = WEEKDAYS[weekday as usize];

        let mut reasons = Vec::new();
        let is_weekend = weekday >= 5;
        if is_weekend && cfg.weekend_blocking {
            reasons.push(format!("weekend ({})", day));
        }
        if !is_weekend && weekday >= cfg.cutoff_weekday && hour >= cfg.cutoff_hour {
            reasons.push(format!("{} at or after {:02}:00", day, cfg.cutoff_hour));
        }
        if let Some(window) = cfg.after_hours {
            if window.contains(hour) {
                reasons.push(format!(
                    "after hours ({:02}:00-{:02}:00)",
                    window.start_hour, window.end_hour
                ));
            }
        }

        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join(", "))
        }
    }

    /// Derive the immutable facts for one evaluation of `change_set`.
    pub fn derive_facts(&self, change_set: &ChangeSet, sources: ContextSources) -> ContextFacts {
        let mut facts = ContextFacts::new(sources.evaluation_time, change_set.tool_version.clone());

        if let Some(drift) = &sources.drift {
            facts = facts.with_drift_conflicts(drift.conflicts_with(change_set));
        }
        if let Some(version) = &change_set.prior_applied_version {
            facts = facts.with_prior_applied_version(version.clone());
        }
        if let Some(intent) = sources.declared_intent.filter(|i| !i.trim().is_empty()) {
            facts = facts.with_declared_intent(intent);
        }
        if sources.emergency_override {
            facts = facts.with_emergency_override(sources.override_reason);
        }
        if let Some(reason) = self.sensitive_window(sources.evaluation_time) {
            facts = facts.with_sensitive_window(reason);
        }

        debug!(
            drift_conflicts = facts.drift_conflicts.len(),
            drift_scan = facts.drift_scan_supplied,
            skew = facts.tool_version_skew,
            sensitive_window = facts.in_sensitive_window(),
            "Derived context facts"
        );
        facts
    }
}

/// Escalate an assessment from context facts.
///
/// The effective tier is always recomputed from the classified tier, so
/// escalating an already escalated assessment changes nothing.
pub fn escalate(assessment: &TierAssessment, facts: &ContextFacts) -> TierAssessment {
    let classified = assessment.classified;
    let mut effective = classified;
    let mut reasons = Vec::new();

    if let Some(window) = &facts.sensitive_window {
        effective = classified.step_up();
        reasons.push(EscalationReason::SensitiveWindow {
            reason: window.clone(),
        });
    }
    if facts.has_drift_conflicts() {
        effective = effective.max(BlastRadiusTier::Red);
        reasons.push(EscalationReason::DriftConflict {
            addresses: facts.drift_conflicts.iter().cloned().collect(),
        });
    }

    if effective > classified {
        warn!(
            classified = %classified,
            effective = %effective,
            reasons = reasons.len(),
            "Escalated blast radius tier"
        );
    }

    TierAssessment {
        classified,
        effective,
        reasons,
    }
}
