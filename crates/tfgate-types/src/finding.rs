//! Rule findings

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Finding severity.
///
/// Ordered so that `Deny` is the greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Deny,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Deny => "deny",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    /// Resource address, or `None` for change-set and context level findings
    pub subject_address: Option<String>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
        subject_address: Option<String>,
    ) -> Self {
        Self {
            severity,
            rule_id: rule_id.into(),
            message: message.into(),
            subject_address,
        }
    }

    pub fn deny(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Deny, rule_id, message, None)
    }

    pub fn warn(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, rule_id, message, None)
    }

    pub fn info(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, rule_id, message, None)
    }

    pub fn on(mut self, address: impl Into<String>) -> Self {
        self.subject_address = Some(address.into());
        self
    }

    pub fn is_deny(&self) -> bool {
        self.severity == Severity::Deny
    }

    /// Canonical report order: severity descending, then rule id, subject, message.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.subject_address.cmp(&other.subject_address))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule_id, self.message)?;
        if let Some(address) = &self.subject_address {
            write!(f, " ({})", address)?;
        }
        Ok(())
    }
}

/// Sort findings into canonical report order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(Finding::report_order);
}
