//! Blast radius classification
//!
//! Scores a change-set as the sum of `action weight x sensitivity weight`
//! over its resources and maps score, resource count and critical changes
//! onto a [`BlastRadiusTier`]. Every comparison is inclusive, so a value on
//! a threshold lands in the higher tier.

use tfgate_types::{
    BlastBreakdown, BlastRadiusReport, BlastRadiusTier, ChangeSet, ResourceChange, SensitivityTag,
};
use tracing::debug;

use crate::config::BlastRadiusConfig;

/// Classifies change-sets into blast radius tiers.
#[derive(Debug, Clone, Default)]
pub struct BlastRadiusClassifier {
    config: BlastRadiusConfig,
}

impl BlastRadiusClassifier {
    pub fn new(config: BlastRadiusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlastRadiusConfig {
        &self.config
    }

    /// Weighted impact of a single resource change.
    pub fn weight(&self, change: &ResourceChange) -> u32 {
        self.config.action_weights.weight(change.kind())
            * self.config.sensitivity_weights.weight(change.sensitivity)
    }

    /// Classify a change-set. An empty change-set is GREEN with score 0.
    pub fn classify(&self, change_set: &ChangeSet) -> BlastRadiusReport {
        let mut breakdown = BlastBreakdown::default();
        let mut score: u32 = 0;

        for change in change_set.changes() {
            let kind = change.kind();
            breakdown.record(kind);
            score = score.saturating_add(self.weight(change));

            if kind.is_destructive() && change.sensitivity.is_critical() {
                breakdown.critical_addresses.push(change.address.clone());
            }
            if change.sensitivity == SensitivityTag::Identity {
                breakdown.identity_addresses.push(change.address.clone());
            }
        }

        let tier = self.tier_for(score, &breakdown);
        debug!(
            resources = breakdown.total,
            score,
            critical = breakdown.critical_addresses.len(),
            tier = %tier,
            "Classified blast radius"
        );

        BlastRadiusReport {
            tier,
            score,
            breakdown,
        }
    }

    fn tier_for(&self, score: u32, breakdown: &BlastBreakdown) -> BlastRadiusTier {
        let cfg = &self.config;
        if breakdown.total >= cfg.red_min_count
            || breakdown.has_critical_change()
            || score >= cfg.red_score
        {
            BlastRadiusTier::Red
        } else if breakdown.total > cfg.green_max_count || score >= cfg.yellow_score {
            BlastRadiusTier::Yellow
        } else {
            BlastRadiusTier::Green
        }
    }
}
