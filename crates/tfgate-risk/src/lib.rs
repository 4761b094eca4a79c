//! # tf-gate Risk
//!
//! Blast radius classification and context escalation.
//!
//! - [`BlastRadiusClassifier`] scores a change-set into a [`BlastRadiusTier`](tfgate_types::BlastRadiusTier)
//! - [`ContextEscalator`] derives [`ContextFacts`](tfgate_types::ContextFacts) from time, drift and versions
//! - [`escalate`] raises, never lowers, the classified tier from those facts

pub mod classifier;
pub mod config;
pub mod escalator;

pub use classifier::BlastRadiusClassifier;
pub use config::{AfterHours, ActionWeights, BlastRadiusConfig, SensitivityWeights, TemporalConfig};
pub use escalator::{escalate, ContextEscalator, ContextSources};
