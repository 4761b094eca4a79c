//! Blast radius tiers and escalation records

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered blast radius tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlastRadiusTier {
    #[default]
    Green,
    Yellow,
    Red,
}

impl BlastRadiusTier {
    /// One tier up, saturating at RED.
    pub fn step_up(self) -> Self {
        match self {
            BlastRadiusTier::Green => BlastRadiusTier::Yellow,
            BlastRadiusTier::Yellow | BlastRadiusTier::Red => BlastRadiusTier::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlastRadiusTier::Green => "GREEN",
            BlastRadiusTier::Yellow => "YELLOW",
            BlastRadiusTier::Red => "RED",
        }
    }

    pub fn all() -> [BlastRadiusTier; 3] {
        [
            BlastRadiusTier::Green,
            BlastRadiusTier::Yellow,
            BlastRadiusTier::Red,
        ]
    }
}

impl fmt::Display for BlastRadiusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a tier was raised above its classified value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationReason {
    /// Evaluation time falls in a sensitive window
    SensitiveWindow { reason: String },
    /// Addresses changed both out-of-band and by the change-set
    DriftConflict { addresses: Vec<String> },
}

impl fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationReason::SensitiveWindow { reason } => {
                write!(f, "sensitive window: {}", reason)
            }
            EscalationReason::DriftConflict { addresses } => {
                write!(f, "drift conflict on {}", addresses.join(", "))
            }
        }
    }
}

/// Classified tier plus the effective tier after escalation.
///
/// `effective >= classified` always holds. Escalation recomputes
/// `effective` from `classified`, never from a previous `effective`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierAssessment {
    pub classified: BlastRadiusTier,
    pub effective: BlastRadiusTier,
    pub reasons: Vec<EscalationReason>,
}

impl TierAssessment {
    /// An assessment not yet escalated.
    pub fn classified(tier: BlastRadiusTier) -> Self {
        Self {
            classified: tier,
            effective: tier,
            reasons: Vec::new(),
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.effective > self.classified
    }
}

impl From<BlastRadiusTier> for TierAssessment {
    fn from(tier: BlastRadiusTier) -> Self {
        Self::classified(tier)
    }
}
