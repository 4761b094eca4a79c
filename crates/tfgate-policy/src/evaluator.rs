//! Parallel rule evaluator
//!
//! Rules are independent: each is evaluated on its own rayon task and
//! observes only the change-set and the context facts. A fault or panic in
//! one rule becomes a `warn` finding under that rule's id and never affects
//! the others. The merged findings are sorted into report order, so the
//! output does not depend on scheduling.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use tfgate_types::{sort_findings, ChangeSet, ContextFacts, Finding, ResourceChange, Severity};
use tracing::{debug, warn};

use crate::error::RuleFault;
use crate::rule::{Rule, RuleScope, RuleSet};
use crate::template::MessageVars;

/// Evaluates a rule set against change-sets.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    rules: RuleSet,
}

impl PolicyEvaluator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate every rule and return the findings in report order.
    pub fn evaluate(&self, change_set: &ChangeSet, facts: &ContextFacts) -> Vec<Finding> {
        debug!(
            rules = self.rules.len(),
            resources = change_set.len(),
            "Evaluating policy rules"
        );

        let mut findings: Vec<Finding> = self
            .rules
            .rules()
            .par_iter()
            .flat_map_iter(|rule| evaluate_isolated(rule, change_set, facts))
            .collect();
        sort_findings(&mut findings);

        let denies = findings.iter().filter(|f| f.is_deny()).count();
        debug!(
            findings = findings.len(),
            denies,
            "Policy evaluation complete"
        );
        findings
    }
}

/// Evaluate one rule, converting a panic into a fault finding.
fn evaluate_isolated(rule: &Rule, change_set: &ChangeSet, facts: &ContextFacts) -> Vec<Finding> {
    match panic::catch_unwind(AssertUnwindSafe(|| evaluate_rule(rule, change_set, facts))) {
        Ok(findings) => findings,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            vec![fault_finding(rule, None, &RuleFault::Panicked { message })]
        }
    }
}

fn evaluate_rule(rule: &Rule, change_set: &ChangeSet, facts: &ContextFacts) -> Vec<Finding> {
    match &rule.scope {
        RuleScope::Resource { when } => change_set
            .changes()
            .iter()
            .filter_map(|change| match when.evaluate(change, facts) {
                Ok(true) => Some(Finding::new(
                    rule.severity,
                    &rule.id,
                    resource_vars(rule, change).render(&rule.message),
                    Some(change.address.clone()),
                )),
                Ok(false) => None,
                Err(fault) => Some(fault_finding(rule, Some(&change.address), &fault)),
            })
            .collect(),

        RuleScope::Aggregate { when, exceeds } => {
            let mut findings = Vec::new();
            let mut count = 0usize;
            for change in change_set.changes() {
                match when.evaluate(change, facts) {
                    Ok(true) => count += 1,
                    Ok(false) => {}
                    Err(fault) => findings.push(fault_finding(rule, Some(&change.address), &fault)),
                }
            }
            if count > *exceeds {
                let vars = MessageVars::new()
                    .set("rule", &rule.id)
                    .set("count", count)
                    .set("threshold", exceeds);
                findings.push(Finding::new(
                    rule.severity,
                    &rule.id,
                    vars.render(&rule.message),
                    None,
                ));
            }
            findings
        }

        RuleScope::Context { fact } => {
            if !fact.holds(facts) {
                return Vec::new();
            }
            let vars = MessageVars::new()
                .set("rule", &rule.id)
                .set("tool_version", &facts.tool_version)
                .set(
                    "prior_version",
                    facts.prior_applied_version.as_deref().unwrap_or("unknown"),
                )
                .set(
                    "window",
                    facts.sensitive_window.as_deref().unwrap_or("none"),
                );
            vec![Finding::new(
                rule.severity,
                &rule.id,
                vars.render(&rule.message),
                None,
            )]
        }
    }
}

fn resource_vars(rule: &Rule, change: &ResourceChange) -> MessageVars {
    MessageVars::new()
        .set("rule", &rule.id)
        .set("address", &change.address)
        .set("kind", &change.resource_kind)
        .set("action", change.kind())
        .set("sensitivity", change.sensitivity.as_str())
}

fn fault_finding(rule: &Rule, address: Option<&str>, fault: &RuleFault) -> Finding {
    warn!(
        rule = %rule.id,
        subject = address.unwrap_or("-"),
        fault = %fault,
        "Rule evaluation failed"
    );
    Finding::new(
        Severity::Warn,
        &rule.id,
        format!("rule evaluation failed: {}", fault),
        address.map(str::to_string),
    )
}
