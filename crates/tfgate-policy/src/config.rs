//! Policy configuration
//!
//! Parameters of the built-in rule families plus custom rule definitions.
//! Patterns are kept as source strings here and compiled when the rule set
//! is built.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tfgate_types::KindSet;

use crate::rule::Rule;

/// Policy rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Kinds whose deletion or replacement is denied
    pub protected_kinds: KindSet,

    /// Address patterns marking production resources
    pub production_patterns: Vec<String>,

    /// Kinds carrying firewall rules
    pub network_rule_kinds: KindSet,

    /// Ports that must never be open to the world
    pub sensitive_ports: BTreeSet<u16>,

    /// Skip the all-ports open egress warning
    pub allow_wildcard_egress: bool,

    pub encryption: EncryptionConfig,

    pub expensive: ExpensiveConfig,

    pub oversized: OversizedConfig,

    /// Attribute transitions that save cost
    pub cost_substitutions: Vec<Substitution>,

    /// Per-kind creation limits
    pub creation_limits: Vec<CreationLimit>,

    /// Built-in rule ids to leave out
    pub disabled_rules: Vec<String>,

    /// Additional declarative rules
    pub custom_rules: Vec<Rule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            protected_kinds: KindSet::new([
                "aws_db_instance",
                "aws_rds_cluster",
                "aws_dynamodb_table",
                "aws_kms_key",
                "aws_s3_bucket",
                "aws_security_group",
            ]),
            production_patterns: vec![r#"(?i)(^|[._\-"\[\]])prod(uction)?([._\-"\[\]]|$)"#.to_string()],
            network_rule_kinds: KindSet::new([
                "aws_security_group",
                "aws_security_group_rule",
                "aws_vpc_security_group_ingress_rule",
                "aws_vpc_security_group_egress_rule",
            ]),
            sensitive_ports: [22, 1433, 3306, 3389, 5432, 6379, 9200, 27017]
                .into_iter()
                .collect(),
            allow_wildcard_egress: false,
            encryption: EncryptionConfig::default(),
            expensive: ExpensiveConfig::default(),
            oversized: OversizedConfig::default(),
            cost_substitutions: vec![
                Substitution::new("volume_type", "gp2", "gp3"),
                Substitution::new("storage_type", "gp2", "gp3"),
            ],
            creation_limits: vec![CreationLimit {
                kind: "aws_nat_gateway".to_string(),
                max: 1,
            }],
            disabled_rules: Vec::new(),
            custom_rules: Vec::new(),
        }
    }
}

/// Storage kinds that must be encrypted at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub kinds: KindSet,
    /// Any one of these being set counts as encrypted
    pub attributes: Vec<String>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            kinds: KindSet::new([
                "aws_db_instance",
                "aws_rds_cluster",
                "aws_ebs_volume",
                "aws_efs_file_system",
                "aws_s3_bucket",
            ]),
            attributes: vec![
                "encrypted".to_string(),
                "storage_encrypted".to_string(),
                "kms_key_id".to_string(),
                "server_side_encryption_configuration".to_string(),
            ],
        }
    }
}

/// Expensive kinds and how many may be created or replaced at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpensiveConfig {
    pub kinds: KindSet,
    pub threshold: usize,
}

impl Default for ExpensiveConfig {
    fn default() -> Self {
        Self {
            kinds: KindSet::new([
                "aws_db_instance",
                "aws_rds_cluster",
                "aws_redshift_cluster",
                "aws_eks_cluster",
                "aws_elasticache_cluster",
                "aws_opensearch_domain",
                "aws_msk_cluster",
            ]),
            threshold: 2,
        }
    }
}

/// Size attributes flagged as oversized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OversizedConfig {
    pub attributes: Vec<String>,
    pub pattern: String,
}

impl Default for OversizedConfig {
    fn default() -> Self {
        Self {
            attributes: vec![
                "instance_type".to_string(),
                "instance_class".to_string(),
                "node_type".to_string(),
            ],
            pattern: r"\.(metal|(12|16|18|24|32|48)xlarge)$".to_string(),
        }
    }
}

/// An attribute moving from `from` to a cheaper `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub attribute: String,
    pub from: Value,
    pub to: Value,
}

impl Substitution {
    pub fn new(attribute: &str, from: &str, to: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            from: Value::String(from.to_string()),
            to: Value::String(to.to_string()),
        }
    }
}

/// At most `max` creations of `kind` in one change-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationLimit {
    pub kind: String,
    pub max: usize,
}
