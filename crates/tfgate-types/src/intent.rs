//! Intent alignment verdicts

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of comparing a declared intent against a change summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntentVerdict {
    Aligned,
    Mismatch,
    Indeterminate,
}

impl IntentVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentVerdict::Aligned => "ALIGNED",
            IntentVerdict::Mismatch => "MISMATCH",
            IntentVerdict::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for IntentVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict with explanation and confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAssessment {
    pub verdict: IntentVerdict,
    pub explanation: Option<String>,
    pub confidence: f64,
}

impl IntentAssessment {
    /// Confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(verdict: IntentVerdict, confidence: f64, explanation: Option<String>) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            verdict,
            explanation,
            confidence,
        }
    }

    pub fn aligned(confidence: f64, explanation: impl Into<String>) -> Self {
        Self::new(IntentVerdict::Aligned, confidence, Some(explanation.into()))
    }

    pub fn mismatch(confidence: f64, explanation: impl Into<String>) -> Self {
        Self::new(IntentVerdict::Mismatch, confidence, Some(explanation.into()))
    }

    /// INDETERMINATE with zero confidence.
    pub fn indeterminate(explanation: impl Into<String>) -> Self {
        Self::new(IntentVerdict::Indeterminate, 0.0, Some(explanation.into()))
    }
}
