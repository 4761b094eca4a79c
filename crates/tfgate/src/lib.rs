//! # tf-gate
//!
//! Risk decision engine that gates the application of an infrastructure
//! change-set behind a single GO/NO-GO verdict.
//!
//! ## Pipeline
//!
//! 1. [`BlastRadiusClassifier`] scores the change-set into a tier
//! 2. [`ContextEscalator`] derives context facts and may raise the tier
//! 3. [`PolicyEvaluator`] evaluates the rule set in parallel, while
//!    [`IntentAligner`] checks the declared intent under a timeout
//! 4. [`DecisionAggregator`] combines everything into a [`Decision`]
//!
//! [`Gatekeeper`] wires the stages from one immutable [`GateConfig`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tfgate::{ContextSources, FileDocumentProvider, FileDriftSource, GateConfig, Gatekeeper};
//!
//! let gate = Gatekeeper::new(Arc::new(GateConfig::load(None)?))?;
//! let decision = gate
//!     .run(
//!         &FileDocumentProvider::new("plan.json"),
//!         &FileDriftSource::new("drift.json"),
//!         ContextSources::at(chrono::Utc::now()).with_declared_intent("update tags"),
//!     )
//!     .await?;
//! std::process::exit(decision.exit_code());
//! ```

pub mod aggregator;
pub mod gatekeeper;
pub mod ports;

pub use aggregator::{Decision, DecisionAggregator, Signals, INTENT_ALIGNMENT};
pub use gatekeeper::{Gatekeeper, POLICY_EVALUATION};
pub use ports::{
    DocumentProvider, DriftSource, FileDocumentProvider, FileDriftSource, NoDriftSource,
    StaticDocumentProvider, StaticDriftSource,
};

pub use tfgate_config::{ConfigError, GateConfig, LoggingConfig};
pub use tfgate_intent::{IntentAligner, IntentAlignment, IntentClassifier, KeywordIntentClassifier};
pub use tfgate_policy::{ids, PolicyEvaluator, Rule, RuleSet};
pub use tfgate_risk::{escalate, BlastRadiusClassifier, ContextEscalator, ContextSources};
pub use tfgate_types::*;
