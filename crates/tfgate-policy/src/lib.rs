//! # tf-gate Policy
//!
//! Declarative rule evaluation over change-sets.
//!
//! ## Overview
//!
//! A rule pairs a typed [`Predicate`] with a severity and a message
//! template. Predicates form a small closed algebra over one resource change
//! and the evaluation's context facts, so rule sets are plain data: they can
//! be loaded from configuration, listed, and evaluated in parallel.
//!
//! ## Key Components
//!
//! - [`Predicate`]: the rule algebra
//! - [`Rule`] / [`RuleScope`]: per-resource, aggregate and context rules
//! - [`RuleSet`]: immutable set of rules with unique ids
//! - [`PolicyEvaluator`]: parallel, fault-isolated evaluation
//! - [`PolicyConfig`]: parameters of the built-in rule families
//!
//! ## Built-in Rule Families
//!
//! Protected-resource deletion, production deletion guard, open network
//! exposure, mandatory encryption, cost flags (expensive count, oversized
//! sizes, cost-saving substitutions), per-kind creation limits, drift
//! conflicts, tool version skew and sensitive windows. See [`builtin::ids`].

pub mod builtin;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod network;
pub mod pattern;
pub mod predicate;
pub mod rule;
pub mod template;

pub use builtin::{builtin_rules, ids};
pub use config::{
    CreationLimit, EncryptionConfig, ExpensiveConfig, OversizedConfig, PolicyConfig, Substitution,
};
pub use error::{PolicyError, Result, RuleFault};
pub use evaluator::PolicyEvaluator;
pub use network::{Exposure, ExposureLevel};
pub use pattern::Pattern;
pub use predicate::Predicate;
pub use rule::{ContextFact, Rule, RuleScope, RuleSet};
pub use template::MessageVars;
