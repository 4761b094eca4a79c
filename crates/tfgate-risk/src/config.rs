//! Risk configuration

use serde::{Deserialize, Serialize};
use tfgate_types::{ActionKind, KindTaxonomy, SensitivityTag};

/// Blast radius thresholds and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastRadiusConfig {
    /// Largest resource count still eligible for GREEN
    #[serde(default = "default_green_max_count")]
    pub green_max_count: usize,

    /// Resource count at which the tier becomes RED
    #[serde(default = "default_red_min_count")]
    pub red_min_count: usize,

    /// Weighted score at which the tier is at least YELLOW
    #[serde(default = "default_yellow_score")]
    pub yellow_score: u32,

    /// Weighted score at which the tier becomes RED
    #[serde(default = "default_red_score")]
    pub red_score: u32,

    #[serde(default)]
    pub action_weights: ActionWeights,

    #[serde(default)]
    pub sensitivity_weights: SensitivityWeights,

    /// Resource kind to sensitivity mapping
    #[serde(default)]
    pub taxonomy: KindTaxonomy,
}

impl Default for BlastRadiusConfig {
    fn default() -> Self {
        Self {
            green_max_count: default_green_max_count(),
            red_min_count: default_red_min_count(),
            yellow_score: default_yellow_score(),
            red_score: default_red_score(),
            action_weights: ActionWeights::default(),
            sensitivity_weights: SensitivityWeights::default(),
            taxonomy: KindTaxonomy::default(),
        }
    }
}

/// Weight of each action shape. Delete is strictly highest, create strictly lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionWeights {
    pub create: u32,
    pub update: u32,
    pub replace: u32,
    pub delete: u32,
}

impl ActionWeights {
    pub fn weight(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Create => self.create,
            ActionKind::Update => self.update,
            ActionKind::Replace => self.replace,
            ActionKind::Delete => self.delete,
        }
    }
}

impl Default for ActionWeights {
    fn default() -> Self {
        Self {
            create: 1,
            update: 2,
            replace: 3,
            delete: 4,
        }
    }
}

/// Weight of each sensitivity tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityWeights {
    pub none: u32,
    pub network: u32,
    pub stateful: u32,
    pub identity: u32,
}

impl SensitivityWeights {
    pub fn weight(&self, tag: SensitivityTag) -> u32 {
        match tag {
            SensitivityTag::None => self.none,
            SensitivityTag::Network => self.network,
            SensitivityTag::Stateful => self.stateful,
            SensitivityTag::Identity => self.identity,
        }
    }
}

impl Default for SensitivityWeights {
    fn default() -> Self {
        Self {
            none: 1,
            network: 2,
            stateful: 3,
            identity: 3,
        }
    }
}

/// Sensitive time window parameters.
///
/// Weekdays are indexed from Monday = 0, so the default cutoff weekday 4 is Friday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConfig {
    /// First weekday on which the afternoon cutoff applies
    #[serde(default = "default_cutoff_weekday")]
    pub cutoff_weekday: u32,

    /// Hour (0-23) from which the cutoff applies
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u32,

    /// Treat all of Saturday and Sunday as sensitive
    #[serde(default = "default_true")]
    pub weekend_blocking: bool,

    /// Optional nightly window, disabled by default
    #[serde(default)]
    pub after_hours: Option<AfterHours>,

    /// Fixed offset from UTC at which wall-clock rules are interpreted
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            cutoff_weekday: default_cutoff_weekday(),
            cutoff_hour: default_cutoff_hour(),
            weekend_blocking: true,
            after_hours: None,
            utc_offset_minutes: 0,
        }
    }
}

/// Nightly window from `start_hour` until `end_hour` the next morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterHours {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl AfterHours {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

impl Default for AfterHours {
    fn default() -> Self {
        Self {
            start_hour: 18,
            end_hour: 9,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_green_max_count() -> usize {
    5
}

fn default_red_min_count() -> usize {
    20
}

fn default_yellow_score() -> u32 {
    15
}

fn default_red_score() -> u32 {
    60
}

fn default_cutoff_weekday() -> u32 {
    4
}

fn default_cutoff_hour() -> u32 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_strictly_ordered() {
        let w = ActionWeights::default();
        assert!(w.delete > w.replace && w.replace > w.update && w.update > w.create);

        let s = SensitivityWeights::default();
        assert!(s.stateful > s.network && s.identity > s.network && s.network > s.none);
    }

    #[test]
    fn after_hours_wraps_midnight() {
        let window = AfterHours::default();
        assert!(window.contains(22));
        assert!(window.contains(3));
        assert!(!window.contains(9));
        assert!(!window.contains(12));
    }
}
