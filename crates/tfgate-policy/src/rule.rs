//! Rules and rule sets

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tfgate_types::{ContextFacts, Severity};

use crate::error::{PolicyError, Result};
use crate::predicate::Predicate;

/// What a rule inspects and how many findings it can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RuleScope {
    /// One finding per matching resource
    Resource { when: Predicate },

    /// One finding when more than `exceeds` resources match
    Aggregate { when: Predicate, exceeds: usize },

    /// One finding when a context fact holds
    Context { fact: ContextFact },
}

impl RuleScope {
    pub fn name(&self) -> &'static str {
        match self {
            RuleScope::Resource { .. } => "resource",
            RuleScope::Aggregate { .. } => "aggregate",
            RuleScope::Context { .. } => "context",
        }
    }
}

/// Context facts a rule can fire on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextFact {
    ToolVersionSkew,
    SensitiveWindow,
}

impl ContextFact {
    pub fn holds(&self, facts: &ContextFacts) -> bool {
        match self {
            ContextFact::ToolVersionSkew => facts.tool_version_skew,
            ContextFact::SensitiveWindow => facts.in_sensitive_window(),
        }
    }
}

/// A named, declarative rule.
///
/// `message` is a template; see [`MessageVars`](crate::template::MessageVars).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub message: String,
    #[serde(flatten)]
    pub scope: RuleScope,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        scope: RuleScope,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            description: String::new(),
            message: message.into(),
            scope,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.id, self.severity, self.scope.name())
    }
}

/// An immutable set of rules with unique ids.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Arc<Vec<Rule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if rule.id.trim().is_empty() {
                return Err(PolicyError::EmptyRuleId);
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(PolicyError::DuplicateRuleId {
                    rule_id: rule.id.clone(),
                });
            }
        }
        Ok(Self {
            rules: Arc::new(rules),
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
