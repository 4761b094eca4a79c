//! Blast radius classification output

use serde::{Deserialize, Serialize};

use crate::change::ActionKind;
use crate::tier::BlastRadiusTier;

/// Per-action counts and the critical addresses behind a classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastBreakdown {
    pub total: usize,
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    /// Stateful or identity resources that are deleted or replaced
    pub critical_addresses: Vec<String>,
    /// Identity resources touched by any action
    pub identity_addresses: Vec<String>,
}

impl BlastBreakdown {
    pub fn record(&mut self, kind: ActionKind) {
        self.total += 1;
        match kind {
            ActionKind::Create => self.create += 1,
            ActionKind::Update => self.update += 1,
            ActionKind::Replace => self.replace += 1,
            ActionKind::Delete => self.delete += 1,
        }
    }

    pub fn has_critical_change(&self) -> bool {
        !self.critical_addresses.is_empty() || !self.identity_addresses.is_empty()
    }
}

/// Result of classifying a change-set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadiusReport {
    pub tier: BlastRadiusTier,
    pub score: u32,
    pub breakdown: BlastBreakdown,
}
