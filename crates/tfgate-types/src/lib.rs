//! # tf-gate Types
//!
//! Shared data model of the tf-gate risk decision engine.
//!
//! ## Key Components
//!
//! - [`ChangeSet`]: validated set of proposed resource changes
//! - [`PlanDocument`] / [`DriftScan`]: ingestion of planning-tool documents
//! - [`BlastRadiusTier`] / [`TierAssessment`]: ordered impact tiers and escalation
//! - [`ContextFacts`]: immutable per-evaluation context
//! - [`Finding`]: a single rule result
//! - [`IntentAssessment`]: intent alignment verdict
//! - [`ExitClass`] / [`DegradedSignal`]: decision outcome markers
//!
//! Everything here is plain data. The components that compute these values
//! live in the `tfgate-risk`, `tfgate-policy`, `tfgate-intent` and `tfgate`
//! crates.

pub mod blast;
pub mod change;
pub mod context;
pub mod document;
pub mod error;
pub mod finding;
pub mod intent;
pub mod outcome;
pub mod tier;

pub use blast::{BlastBreakdown, BlastRadiusReport};
pub use change::{
    value_kind, Action, ActionKind, ActionSet, Attributes, ChangeSet, ChangeSummary, KindPattern,
    KindSet, KindTaxonomy, ResourceChange, SensitivityTag,
};
pub use context::ContextFacts;
pub use document::{DriftScan, PlanDocument};
pub use error::{GateError, Result};
pub use finding::{sort_findings, Finding, Severity};
pub use intent::{IntentAssessment, IntentVerdict};
pub use outcome::{DegradedSignal, ExitClass};
pub use tier::{BlastRadiusTier, EscalationReason, TierAssessment};
