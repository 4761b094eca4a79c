//! Exit classification and degraded-signal markers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal classification of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitClass {
    Ok,
    PolicyBlock,
    DriftConflict,
    IntentMismatch,
    BreakGlass,
}

impl ExitClass {
    /// Process exit code for pipeline integration.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitClass::Ok => 0,
            ExitClass::PolicyBlock => 1,
            ExitClass::DriftConflict => 2,
            ExitClass::IntentMismatch => 3,
            ExitClass::BreakGlass => 42,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExitClass::Ok => "OK",
            ExitClass::PolicyBlock => "POLICY_BLOCK",
            ExitClass::DriftConflict => "DRIFT_CONFLICT",
            ExitClass::IntentMismatch => "INTENT_MISMATCH",
            ExitClass::BreakGlass => "BREAK_GLASS",
        }
    }
}

impl fmt::Display for ExitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal source that was unavailable, lowering confidence in the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedSignal {
    /// No drift scan supplied; drift conflicts unknown
    DriftScanUnavailable,
    /// No prior applied version; version skew unknown
    PriorVersionUnknown,
    /// No declared intent; alignment not checked
    IntentNotDeclared,
    /// Intent classifier timed out or failed
    IntentClassifierUnavailable,
}

impl DegradedSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedSignal::DriftScanUnavailable => "drift_scan_unavailable",
            DegradedSignal::PriorVersionUnknown => "prior_version_unknown",
            DegradedSignal::IntentNotDeclared => "intent_not_declared",
            DegradedSignal::IntentClassifierUnavailable => "intent_classifier_unavailable",
        }
    }
}

impl fmt::Display for DegradedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_pipeline_contract() {
        assert_eq!(ExitClass::Ok.exit_code(), 0);
        assert_eq!(ExitClass::PolicyBlock.exit_code(), 1);
        assert_eq!(ExitClass::DriftConflict.exit_code(), 2);
        assert_eq!(ExitClass::IntentMismatch.exit_code(), 3);
        assert_eq!(ExitClass::BreakGlass.exit_code(), 42);
    }

    #[test]
    fn exit_class_serializes_screaming() {
        let json = serde_json::to_string(&ExitClass::PolicyBlock).unwrap();
        assert_eq!(json, "\"POLICY_BLOCK\"");
    }
}
