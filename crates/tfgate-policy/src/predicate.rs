//! Rule predicate algebra
//!
//! A closed, serializable set of predicates over one [`ResourceChange`] and
//! the evaluation's [`ContextFacts`]. Predicates are pure; malformed input
//! surfaces as a [`RuleFault`] instead of a panic or a silent `false`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tfgate_types::{
    value_kind, ActionKind, ContextFacts, KindSet, ResourceChange, SensitivityTag,
};

use crate::error::RuleFault;
use crate::network::{self, Direction, ExposureLevel};
use crate::pattern::Pattern;

/// A typed predicate over a single resource change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Always true
    Always,

    /// Resource kind matches one of the patterns
    KindIn { kinds: KindSet },

    /// Sensitivity tag is one of the given tags
    SensitivityIn { tags: Vec<SensitivityTag> },

    /// Action shape is one of the given shapes
    ActionIn { actions: Vec<ActionKind> },

    /// The existing object is destroyed (delete or replace)
    Destructive,

    /// Address matches a regular expression
    AddressMatches { pattern: Pattern },

    /// None of the attributes is set to a truthy value in the after-state
    AttributeAbsent { attributes: Vec<String> },

    /// A string attribute in the after-state matches a regular expression
    AttributeMatches { attribute: String, pattern: Pattern },

    /// An attribute moves from one value to another
    AttributeChanged {
        attribute: String,
        from: Value,
        to: Value,
    },

    /// Unrestricted traffic at the given exposure level
    OpenNetworkExposure {
        level: ExposureLevel,
        #[serde(default)]
        direction: Direction,
        #[serde(default)]
        sensitive_ports: BTreeSet<u16>,
    },

    /// The address also changed out-of-band
    InDriftConflict,

    /// Every predicate holds
    All { of: Vec<Predicate> },

    /// At least one predicate holds
    Any { of: Vec<Predicate> },

    /// The predicate does not hold
    Not { predicate: Box<Predicate> },
}

impl Predicate {
    pub fn all(of: Vec<Predicate>) -> Self {
        Predicate::All { of }
    }

    pub fn any(of: Vec<Predicate>) -> Self {
        Predicate::Any { of }
    }

    pub fn negate(predicate: Predicate) -> Self {
        Predicate::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn kinds(kinds: KindSet) -> Self {
        Predicate::KindIn { kinds }
    }

    pub fn actions(actions: impl IntoIterator<Item = ActionKind>) -> Self {
        Predicate::ActionIn {
            actions: actions.into_iter().collect(),
        }
    }

    /// Evaluate against one change.
    ///
    /// `All` and `Any` short-circuit left to right, so a fault in a later
    /// operand is only raised when that operand is reached.
    pub fn evaluate(&self, change: &ResourceChange, facts: &ContextFacts) -> Result<bool, RuleFault> {
        match self {
            Predicate::Always => Ok(true),
            Predicate::KindIn { kinds } => Ok(kinds.contains(&change.resource_kind)),
            Predicate::SensitivityIn { tags } => Ok(tags.contains(&change.sensitivity)),
            Predicate::ActionIn { actions } => Ok(actions.contains(&change.kind())),
            Predicate::Destructive => Ok(change.kind().is_destructive()),
            Predicate::AddressMatches { pattern } => Ok(pattern.is_match(&change.address)),
            Predicate::AttributeAbsent { attributes } => attribute_absent(change, attributes),
            Predicate::AttributeMatches { attribute, pattern } => {
                match change.after_attribute(attribute) {
                    None | Some(Value::Null) => Ok(false),
                    Some(Value::String(value)) => Ok(pattern.is_match(value)),
                    Some(other) => Err(RuleFault::UnexpectedType {
                        address: change.address.clone(),
                        attribute: attribute.clone(),
                        expected: "string",
                        found: value_kind(other),
                    }),
                }
            }
            Predicate::AttributeChanged {
                attribute,
                from,
                to,
            } => Ok(change.before_attribute(attribute) == Some(from)
                && change.after_attribute(attribute) == Some(to)),
            Predicate::OpenNetworkExposure {
                level,
                direction,
                sensitive_ports,
            } => Ok(network::analyze(change, *direction, sensitive_ports)?
                .is_some_and(|exposure| exposure.level() == *level)),
            Predicate::InDriftConflict => Ok(facts.drift_conflicts.contains(&change.address)),
            Predicate::All { of } => {
                for predicate in of {
                    if !predicate.evaluate(change, facts)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Any { of } => {
                for predicate in of {
                    if predicate.evaluate(change, facts)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not { predicate } => Ok(!predicate.evaluate(change, facts)?),
        }
    }
}

fn attribute_absent(change: &ResourceChange, attributes: &[String]) -> Result<bool, RuleFault> {
    let after = match &change.after {
        Some(after) => after,
        None if change.kind() == ActionKind::Delete => return Ok(false),
        None => {
            return Err(RuleFault::MissingAfterState {
                address: change.address.clone(),
            })
        }
    };
    Ok(!attributes
        .iter()
        .any(|name| after.get(name).is_some_and(is_truthy)))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
