//! Intent alignment configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Intent alignment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Treat MISMATCH and INDETERMINATE as blocking
    #[serde(default)]
    pub mandatory: bool,

    /// Upper bound on a classifier call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Words that suggest a narrow, low-impact change
    #[serde(default = "default_narrow_terms")]
    pub narrow_terms: Vec<String>,

    /// Words that announce destructive or sweeping change
    #[serde(default = "default_broad_terms")]
    pub broad_terms: Vec<String>,
}

impl IntentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            mandatory: false,
            timeout_ms: default_timeout_ms(),
            narrow_terms: default_narrow_terms(),
            broad_terms: default_broad_terms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_narrow_terms() -> Vec<String> {
    [
        "tag", "tags", "tagging", "label", "labels", "comment", "comments", "docs",
        "documentation", "typo", "cosmetic", "format", "formatting", "readme",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_broad_terms() -> Vec<String> {
    [
        "delete", "remove", "destroy", "replace", "decommission", "migrate", "migration",
        "teardown", "drop", "recreate", "rebuild", "cleanup", "deprecate",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
