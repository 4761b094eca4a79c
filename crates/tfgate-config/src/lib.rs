//! # tf-gate Config
//!
//! The immutable configuration of one gate evaluation. Built once per
//! invocation from defaults, an optional file and `TFGATE_`-prefixed
//! environment variables, validated, then shared read-only.
//!
//! Environment keys use `__` between path segments, for example
//! `TFGATE_INTENT__MANDATORY=true` or `TFGATE_BLAST_RADIUS__RED_MIN_COUNT=30`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use tfgate_intent::IntentConfig;
pub use tfgate_policy::PolicyConfig;
pub use tfgate_risk::{BlastRadiusConfig, TemporalConfig};

use tfgate_policy::{PolicyError, RuleSet};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TFGATE";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range or inconsistent with another
    #[error("Invalid configuration in '{section}': {reason}")]
    Invalid { section: &'static str, reason: String },

    /// The rule set cannot be built
    #[error("Invalid policy rules: {0}")]
    Policy(#[from] PolicyError),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Complete gate configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Blast radius thresholds, weights and kind taxonomy
    #[serde(default)]
    pub blast_radius: BlastRadiusConfig,

    /// Sensitive time windows
    #[serde(default)]
    pub temporal: TemporalConfig,

    /// Policy rules
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Intent alignment
    #[serde(default)]
    pub intent: IntentConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GateConfig {
    /// Load configuration: defaults, then the file at `path`, then environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&GateConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Add environment variables with TFGATE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: GateConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(
            path = ?path,
            custom_rules = config.policy.custom_rules.len(),
            mandatory_intent = config.intent.mandatory,
            "Loaded gate configuration"
        );
        Ok(config)
    }

    /// Check ranges and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_blast_radius()?;
        self.validate_temporal()?;
        if self.intent.timeout_ms == 0 {
            return Err(invalid("intent", "timeout_ms must be positive"));
        }
        self.rule_set()?;
        Ok(())
    }

    /// Build the rule set described by the policy section.
    pub fn rule_set(&self) -> Result<RuleSet> {
        Ok(RuleSet::from_config(&self.policy)?)
    }

    fn validate_blast_radius(&self) -> Result<()> {
        let b = &self.blast_radius;
        if b.green_max_count >= b.red_min_count {
            return Err(invalid(
                "blast_radius",
                format!(
                    "green_max_count ({}) must be below red_min_count ({})",
                    b.green_max_count, b.red_min_count
                ),
            ));
        }
        if b.yellow_score > b.red_score {
            return Err(invalid(
                "blast_radius",
                format!(
                    "yellow_score ({}) must not exceed red_score ({})",
                    b.yellow_score, b.red_score
                ),
            ));
        }
        let a = &b.action_weights;
        if !(0 < a.create && a.create < a.update && a.update < a.replace && a.replace < a.delete) {
            return Err(invalid(
                "blast_radius",
                "action weights must satisfy 0 < create < update < replace < delete",
            ));
        }
        let s = &b.sensitivity_weights;
        if !(0 < s.none && s.none < s.network && s.network < s.stateful && s.network < s.identity)
        {
            return Err(invalid(
                "blast_radius",
                "sensitivity weights must satisfy 0 < none < network < stateful, identity",
            ));
        }
        Ok(())
    }

    fn validate_temporal(&self) -> Result<()> {
        let t = &self.temporal;
        if t.cutoff_weekday > 6 {
            return Err(invalid("temporal", "cutoff_weekday must be 0 (Monday) to 6"));
        }
        if t.cutoff_hour > 23 {
            return Err(invalid("temporal", "cutoff_hour must be 0 to 23"));
        }
        if let Some(window) = t.after_hours {
            if window.start_hour > 23 || window.end_hour > 23 || window.start_hour == window.end_hour
            {
                return Err(invalid(
                    "temporal",
                    "after_hours needs distinct start_hour and end_hour in 0 to 23",
                ));
            }
        }
        if t.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(invalid("temporal", "utc_offset_minutes must be within a day"));
        }
        Ok(())
    }
}

fn invalid(section: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section,
        reason: reason.into(),
    }
}
