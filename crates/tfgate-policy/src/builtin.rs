//! Built-in rule families
//!
//! Every built-in is an ordinary [`Rule`] over the predicate algebra,
//! parameterized by [`PolicyConfig`]. Custom rules from configuration are
//! appended after the built-ins.

use tfgate_types::{ActionKind, KindSet, Severity};

use crate::config::PolicyConfig;
use crate::error::Result;
use crate::network::{Direction, ExposureLevel};
use crate::pattern::Pattern;
use crate::predicate::Predicate;
use crate::rule::{ContextFact, Rule, RuleScope, RuleSet};

/// Ids of the built-in rules.
pub mod ids {
    pub const PROTECTED_RESOURCE_DELETION: &str = "protected-resource-deletion";
    pub const PRODUCTION_DELETION_GUARD: &str = "production-deletion-guard";
    pub const OPEN_NETWORK_EXPOSURE: &str = "open-network-exposure";
    pub const OPEN_NETWORK_INGRESS: &str = "open-network-ingress";
    pub const OPEN_NETWORK_EGRESS: &str = "open-network-egress";
    pub const MANDATORY_ENCRYPTION: &str = "mandatory-encryption";
    pub const EXPENSIVE_INSTANCE_COUNT: &str = "expensive-instance-count";
    pub const OVERSIZED_INSTANCE: &str = "oversized-instance";
    pub const COST_SAVING_SUBSTITUTION: &str = "cost-saving-substitution";
    pub const CREATION_LIMIT_PREFIX: &str = "creation-limit";
    pub const TOOL_VERSION_SKEW: &str = "tool-version-skew";
    pub const SENSITIVE_WINDOW: &str = "sensitive-window";
    pub const DRIFT_CONFLICT: &str = "drift-conflict";
}

const WRITES: [ActionKind; 3] = [ActionKind::Create, ActionKind::Update, ActionKind::Replace];

/// Build the built-in rules from configuration, skipping disabled ids.
pub fn builtin_rules(config: &PolicyConfig) -> Result<Vec<Rule>> {
    let mut rules = vec![
        Rule::new(
            ids::PROTECTED_RESOURCE_DELETION,
            Severity::Deny,
            "Protected resource {address} ({kind}) would be destroyed by {action}",
            RuleScope::Resource {
                when: Predicate::all(vec![
                    Predicate::kinds(config.protected_kinds.clone()),
                    Predicate::Destructive,
                ]),
            },
        )
        .with_description("Deny delete or replace of protected resource kinds"),
    ];

    if !config.production_patterns.is_empty() {
        let patterns = config
            .production_patterns
            .iter()
            .map(|source| {
                Pattern::new(source).map(|pattern| Predicate::AddressMatches { pattern })
            })
            .collect::<Result<Vec<_>>>()?;
        rules.push(
            Rule::new(
                ids::PRODUCTION_DELETION_GUARD,
                Severity::Deny,
                "Production resource {address} would be destroyed by {action}",
                RuleScope::Resource {
                    when: Predicate::all(vec![Predicate::Destructive, Predicate::any(patterns)]),
                },
            )
            .with_description("Deny delete or replace of addresses matching production patterns"),
        );
    }

    rules.push(
        Rule::new(
            ids::OPEN_NETWORK_EXPOSURE,
            Severity::Deny,
            "{address} allows unrestricted ingress on all ports or a sensitive port",
            RuleScope::Resource {
                when: Predicate::all(vec![
                    Predicate::kinds(config.network_rule_kinds.clone()),
                    Predicate::OpenNetworkExposure {
                        level: ExposureLevel::Critical,
                        direction: Direction::Ingress,
                        sensitive_ports: config.sensitive_ports.clone(),
                    },
                ]),
            },
        )
        .with_description("Deny 0.0.0.0/0 or ::/0 ingress covering all or sensitive ports"),
    );
    rules.push(
        Rule::new(
            ids::OPEN_NETWORK_INGRESS,
            Severity::Warn,
            "{address} allows unrestricted ingress",
            RuleScope::Resource {
                when: Predicate::all(vec![
                    Predicate::kinds(config.network_rule_kinds.clone()),
                    Predicate::OpenNetworkExposure {
                        level: ExposureLevel::Public,
                        direction: Direction::Ingress,
                        sensitive_ports: config.sensitive_ports.clone(),
                    },
                ]),
            },
        )
        .with_description("Warn on world-open ingress to non-sensitive ports"),
    );

    if !config.allow_wildcard_egress {
        // No sensitive ports for egress: only all-ports egress is critical.
        rules.push(
            Rule::new(
                ids::OPEN_NETWORK_EGRESS,
                Severity::Warn,
                "{address} allows unrestricted egress on all ports",
                RuleScope::Resource {
                    when: Predicate::all(vec![
                        Predicate::kinds(config.network_rule_kinds.clone()),
                        Predicate::OpenNetworkExposure {
                            level: ExposureLevel::Critical,
                            direction: Direction::Egress,
                            sensitive_ports: Default::default(),
                        },
                    ]),
                },
            )
            .with_description("Warn on 0.0.0.0/0 or ::/0 egress covering all ports"),
        );
    }

    if !config.encryption.kinds.is_empty() {
        rules.push(
            Rule::new(
                ids::MANDATORY_ENCRYPTION,
                Severity::Deny,
                "{address} ({kind}) is not encrypted at rest",
                RuleScope::Resource {
                    when: Predicate::all(vec![
                        Predicate::kinds(config.encryption.kinds.clone()),
                        Predicate::actions(WRITES),
                        Predicate::AttributeAbsent {
                            attributes: config.encryption.attributes.clone(),
                        },
                    ]),
                },
            )
            .with_description("Deny storage resources without an encryption attribute"),
        );
    }

    if !config.expensive.kinds.is_empty() {
        rules.push(
            Rule::new(
                ids::EXPENSIVE_INSTANCE_COUNT,
                Severity::Deny,
                "{count} expensive resources created or replaced, limit is {threshold}",
                RuleScope::Aggregate {
                    when: Predicate::all(vec![
                        Predicate::kinds(config.expensive.kinds.clone()),
                        Predicate::actions([ActionKind::Create, ActionKind::Replace]),
                    ]),
                    exceeds: config.expensive.threshold,
                },
            )
            .with_description("Deny when too many expensive resources are provisioned at once"),
        );
    }

    if !config.oversized.attributes.is_empty() {
        let pattern = Pattern::new(&config.oversized.pattern)?;
        let matchers = config
            .oversized
            .attributes
            .iter()
            .map(|attribute| Predicate::AttributeMatches {
                attribute: attribute.clone(),
                pattern: pattern.clone(),
            })
            .collect();
        rules.push(
            Rule::new(
                ids::OVERSIZED_INSTANCE,
                Severity::Warn,
                "{address} ({kind}) uses an oversized instance size",
                RuleScope::Resource {
                    when: Predicate::all(vec![Predicate::actions(WRITES), Predicate::any(matchers)]),
                },
            )
            .with_description("Warn on oversized instance sizes"),
        );
    }

    if !config.cost_substitutions.is_empty() {
        let substitutions = config
            .cost_substitutions
            .iter()
            .map(|s| Predicate::AttributeChanged {
                attribute: s.attribute.clone(),
                from: s.from.clone(),
                to: s.to.clone(),
            })
            .collect();
        rules.push(
            Rule::new(
                ids::COST_SAVING_SUBSTITUTION,
                Severity::Info,
                "{address} moves to a cheaper configuration",
                RuleScope::Resource {
                    when: Predicate::any(substitutions),
                },
            )
            .with_description("Note cost-saving substitutions such as gp2 to gp3"),
        );
    }

    for limit in &config.creation_limits {
        rules.push(
            Rule::new(
                format!("{}:{}", ids::CREATION_LIMIT_PREFIX, limit.kind),
                Severity::Warn,
                format!(
                    "{{count}} {} resources created, limit is {{threshold}}",
                    limit.kind
                ),
                RuleScope::Aggregate {
                    when: Predicate::all(vec![
                        Predicate::kinds(KindSet::new([limit.kind.as_str()])),
                        Predicate::actions([ActionKind::Create]),
                    ]),
                    exceeds: limit.max,
                },
            )
            .with_description(format!("Warn when more than {} {} are created", limit.max, limit.kind)),
        );
    }

    rules.push(
        Rule::new(
            ids::DRIFT_CONFLICT,
            Severity::Warn,
            "{address} was changed out-of-band and would be overwritten",
            RuleScope::Resource {
                when: Predicate::InDriftConflict,
            },
        )
        .with_description("Flag every address present in both the drift scan and the plan"),
    );
    rules.push(
        Rule::new(
            ids::TOOL_VERSION_SKEW,
            Severity::Info,
            "Planning tool version {tool_version} differs from last applied version {prior_version}",
            RuleScope::Context {
                fact: ContextFact::ToolVersionSkew,
            },
        )
        .with_description("Note a planning tool version change"),
    );
    rules.push(
        Rule::new(
            ids::SENSITIVE_WINDOW,
            Severity::Info,
            "Evaluated in a sensitive window: {window}",
            RuleScope::Context {
                fact: ContextFact::SensitiveWindow,
            },
        )
        .with_description("Note evaluation inside a sensitive time window"),
    );

    rules.retain(|rule| !config.disabled_rules.iter().any(|id| id == &rule.id));
    Ok(rules)
}

impl RuleSet {
    /// Built-in rules followed by the configured custom rules.
    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        let mut rules = builtin_rules(config)?;
        rules.extend(config.custom_rules.iter().cloned());
        RuleSet::new(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PolicyError;

    #[test]
    fn default_rule_set_has_every_family() {
        let set = RuleSet::from_config(&PolicyConfig::default()).unwrap();
        for id in [
            ids::PROTECTED_RESOURCE_DELETION,
            ids::PRODUCTION_DELETION_GUARD,
            ids::OPEN_NETWORK_EXPOSURE,
            ids::OPEN_NETWORK_INGRESS,
            ids::OPEN_NETWORK_EGRESS,
            ids::MANDATORY_ENCRYPTION,
            ids::EXPENSIVE_INSTANCE_COUNT,
            ids::OVERSIZED_INSTANCE,
            ids::COST_SAVING_SUBSTITUTION,
            "creation-limit:aws_nat_gateway",
            ids::DRIFT_CONFLICT,
            ids::TOOL_VERSION_SKEW,
            ids::SENSITIVE_WINDOW,
        ] {
            assert!(set.get(id).is_some(), "missing {}", id);
        }
    }

    #[test]
    fn disabled_rules_are_left_out() {
        let config = PolicyConfig {
            disabled_rules: vec![ids::OVERSIZED_INSTANCE.to_string()],
            ..Default::default()
        };
        let set = RuleSet::from_config(&config).unwrap();
        assert!(set.get(ids::OVERSIZED_INSTANCE).is_none());
    }

    #[test]
    fn wildcard_egress_can_be_allowed() {
        let config = PolicyConfig {
            allow_wildcard_egress: true,
            ..Default::default()
        };
        let set = RuleSet::from_config(&config).unwrap();
        assert!(set.get(ids::OPEN_NETWORK_EGRESS).is_none());
        assert!(set.get(ids::OPEN_NETWORK_INGRESS).is_some());
    }

    #[test]
    fn custom_rule_colliding_with_builtin_is_rejected() {
        let mut config = PolicyConfig::default();
        config.custom_rules.push(Rule::new(
            ids::DRIFT_CONFLICT,
            Severity::Deny,
            "dup",
            RuleScope::Resource {
                when: Predicate::Always,
            },
        ));
        assert!(matches!(
            RuleSet::from_config(&config),
            Err(PolicyError::DuplicateRuleId { .. })
        ));
    }

    #[test]
    fn invalid_production_pattern_fails_loading() {
        let config = PolicyConfig {
            production_patterns: vec!["(prod".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            RuleSet::from_config(&config),
            Err(PolicyError::InvalidPattern { .. })
        ));
    }
}
