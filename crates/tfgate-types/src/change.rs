//! Change-set model
//!
//! A [`ChangeSet`] is the validated, in-memory form of a proposed set of
//! resource-level modifications. Construction enforces the structural
//! invariants (non-empty actions, well-formed replaces, unique addresses),
//! so every downstream component can rely on them without re-checking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GateError, Result};

/// Attribute map of a resource before or after the change.
pub type Attributes = BTreeMap<String, Value>;

/// Name of a JSON value's type, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single primitive action on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Parse a planning-tool action string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The effective shape of an action set.
///
/// Ordered from least to most destructive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Replace,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Replace => "replace",
            ActionKind::Delete => "delete",
        }
    }

    /// Whether the existing object is destroyed.
    pub fn is_destructive(&self) -> bool {
        matches!(self, ActionKind::Delete | ActionKind::Replace)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, validated set of actions for one resource.
///
/// Either a single create, update or delete, or a replace made of exactly
/// one delete and one create in either order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
    /// Validate an ordered action list for the resource at `address`.
    pub fn new(address: &str, actions: Vec<Action>) -> Result<Self> {
        Self::check(&actions).map_err(|reason| match reason {
            ActionSetViolation::Empty => GateError::EmptyActions {
                address: address.to_string(),
            },
            ActionSetViolation::Combination => GateError::InvalidActionCombination {
                address: address.to_string(),
                actions: actions.iter().map(|a| a.as_str().to_string()).collect(),
            },
        })?;
        Ok(Self(actions))
    }

    pub fn create() -> Self {
        Self(vec![Action::Create])
    }

    pub fn update() -> Self {
        Self(vec![Action::Update])
    }

    pub fn delete() -> Self {
        Self(vec![Action::Delete])
    }

    /// Destroy-then-create replace.
    pub fn replace() -> Self {
        Self(vec![Action::Delete, Action::Create])
    }

    fn check(actions: &[Action]) -> std::result::Result<(), ActionSetViolation> {
        match actions {
            [] => Err(ActionSetViolation::Empty),
            [_] => Ok(()),
            [Action::Delete, Action::Create] | [Action::Create, Action::Delete] => Ok(()),
            _ => Err(ActionSetViolation::Combination),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.0
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn kind(&self) -> ActionKind {
        match self.0.as_slice() {
            [Action::Create] => ActionKind::Create,
            [Action::Update] => ActionKind::Update,
            [Action::Delete] => ActionKind::Delete,
            _ => ActionKind::Replace,
        }
    }

    /// Replace that creates the new object before destroying the old one.
    pub fn is_create_before_destroy(&self) -> bool {
        matches!(self.0.as_slice(), [Action::Create, Action::Delete])
    }
}

enum ActionSetViolation {
    Empty,
    Combination,
}

impl TryFrom<Vec<Action>> for ActionSet {
    type Error = String;

    fn try_from(actions: Vec<Action>) -> std::result::Result<Self, Self::Error> {
        match Self::check(&actions) {
            Ok(()) => Ok(Self(actions)),
            Err(ActionSetViolation::Empty) => Err("action set must not be empty".into()),
            Err(ActionSetViolation::Combination) => {
                Err(format!("invalid action combination {:?}", actions))
            }
        }
    }
}

impl From<ActionSet> for Vec<Action> {
    fn from(set: ActionSet) -> Self {
        set.0
    }
}

/// Sensitivity of a resource kind, derived from the kind taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityTag {
    None,
    Network,
    Stateful,
    Identity,
}

impl SensitivityTag {
    /// Stateful and identity resources hold data or trust that cannot be recreated.
    pub fn is_critical(&self) -> bool {
        matches!(self, SensitivityTag::Stateful | SensitivityTag::Identity)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityTag::None => "none",
            SensitivityTag::Network => "network",
            SensitivityTag::Stateful => "stateful",
            SensitivityTag::Identity => "identity",
        }
    }
}

/// A resource kind matcher: an exact kind, or a prefix ending in `*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindPattern(String);

impl KindPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn matches(&self, kind: &str) -> bool {
        match self.0.strip_suffix('*') {
            Some(prefix) => kind.starts_with(prefix),
            None => self.0 == kind,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KindPattern {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A set of kind patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindSet(Vec<KindPattern>);

impl KindSet {
    pub fn new<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KindPattern>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.0.iter().any(|p| p.matches(kind))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn patterns(&self) -> &[KindPattern] {
        &self.0
    }
}

/// Maps resource kinds onto sensitivity tags.
///
/// Identity wins over stateful, stateful over network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTaxonomy {
    pub identity: KindSet,
    pub stateful: KindSet,
    pub network: KindSet,
}

impl KindTaxonomy {
    pub fn tag(&self, kind: &str) -> SensitivityTag {
        if self.identity.contains(kind) {
            SensitivityTag::Identity
        } else if self.stateful.contains(kind) {
            SensitivityTag::Stateful
        } else if self.network.contains(kind) {
            SensitivityTag::Network
        } else {
            SensitivityTag::None
        }
    }
}

impl Default for KindTaxonomy {
    fn default() -> Self {
        Self {
            identity: KindSet::new([
                "aws_iam_*",
                "aws_kms_key",
                "aws_kms_alias",
                "aws_secretsmanager_secret",
                "azurerm_key_vault",
                "azurerm_role_assignment",
                "google_kms_key_ring",
                "google_kms_crypto_key",
                "google_service_account",
                "google_project_iam_*",
            ]),
            stateful: KindSet::new([
                "aws_db_instance",
                "aws_rds_cluster",
                "aws_s3_bucket",
                "aws_dynamodb_table",
                "aws_elasticache_cluster",
                "aws_redshift_cluster",
                "aws_mq_broker",
                "aws_docdb_cluster",
                "aws_neptune_cluster",
                "aws_memorydb_cluster",
                "aws_qldb_ledger",
                "aws_ebs_volume",
                "aws_efs_file_system",
                "azurerm_sql_database",
                "azurerm_sql_server",
                "azurerm_storage_account",
                "azurerm_cosmosdb_account",
                "google_sql_database_instance",
                "google_storage_bucket",
            ]),
            network: KindSet::new([
                "aws_security_group",
                "aws_security_group_rule",
                "aws_vpc_security_group_*",
                "aws_network_acl*",
                "aws_lb",
                "aws_alb",
                "aws_elb",
                "aws_lb_listener*",
                "aws_route*",
                "aws_vpc",
                "aws_subnet",
                "aws_nat_gateway",
                "azurerm_network_security_*",
                "google_compute_firewall",
            ]),
        }
    }
}

/// A single proposed resource modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    pub resource_kind: String,
    pub actions: ActionSet,
    pub before: Option<Attributes>,
    pub after: Option<Attributes>,
    pub sensitivity: SensitivityTag,
}

impl ResourceChange {
    /// Build a change, deriving its sensitivity from the taxonomy.
    pub fn new(
        address: impl Into<String>,
        resource_kind: impl Into<String>,
        actions: ActionSet,
        taxonomy: &KindTaxonomy,
    ) -> Self {
        let resource_kind = resource_kind.into();
        let sensitivity = taxonomy.tag(&resource_kind);
        Self {
            address: address.into(),
            resource_kind,
            actions,
            before: None,
            after: None,
            sensitivity,
        }
    }

    pub fn with_before(mut self, before: Attributes) -> Self {
        self.before = Some(before);
        self
    }

    pub fn with_after(mut self, after: Attributes) -> Self {
        self.after = Some(after);
        self
    }

    pub fn kind(&self) -> ActionKind {
        self.actions.kind()
    }

    /// Attribute value in the after-state.
    pub fn after_attribute(&self, name: &str) -> Option<&Value> {
        self.after.as_ref().and_then(|a| a.get(name))
    }

    /// Attribute value in the before-state.
    pub fn before_attribute(&self, name: &str) -> Option<&Value> {
        self.before.as_ref().and_then(|a| a.get(name))
    }
}

/// A validated, ordered change-set.
///
/// Only constructible through [`ChangeSet::new`], so it is serializable
/// for reporting but never deserialized around its invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet {
    changes: Vec<ResourceChange>,
    pub tool_version: String,
    pub generated_at: Option<DateTime<Utc>>,
    pub prior_applied_version: Option<String>,
}

impl ChangeSet {
    /// Validate and build a change-set. Addresses must be unique.
    pub fn new(tool_version: impl Into<String>, changes: Vec<ResourceChange>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for change in &changes {
            if change.address.is_empty() {
                return Err(GateError::missing("address", Some(change.resource_kind.clone())));
            }
            if !seen.insert(change.address.as_str()) {
                return Err(GateError::DuplicateAddress {
                    address: change.address.clone(),
                });
            }
        }
        Ok(Self {
            changes,
            tool_version: tool_version.into(),
            generated_at: None,
            prior_applied_version: None,
        })
    }

    /// An empty change-set.
    pub fn empty(tool_version: impl Into<String>) -> Self {
        Self {
            changes: Vec::new(),
            tool_version: tool_version.into(),
            generated_at: None,
            prior_applied_version: None,
        }
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    pub fn with_prior_applied_version(mut self, version: impl Into<String>) -> Self {
        self.prior_applied_version = Some(version.into());
        self
    }

    pub fn changes(&self) -> &[ResourceChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&ResourceChange> {
        self.changes.iter().find(|c| c.address == address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.address.as_str())
    }

    /// Structural summary used for intent alignment.
    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary::from_change_set(self)
    }
}

/// Structural summary of a change-set: what kinds of actions touch what kinds of resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub total: usize,
    pub actions: BTreeMap<ActionKind, usize>,
    pub resource_kinds: BTreeSet<String>,
    pub destructive_addresses: Vec<String>,
}

impl ChangeSummary {
    pub fn from_change_set(change_set: &ChangeSet) -> Self {
        let mut summary = ChangeSummary {
            total: change_set.len(),
            ..Default::default()
        };
        for change in change_set.changes() {
            let kind = change.kind();
            *summary.actions.entry(kind).or_insert(0) += 1;
            summary.resource_kinds.insert(change.resource_kind.clone());
            if kind.is_destructive() {
                summary.destructive_addresses.push(change.address.clone());
            }
        }
        summary
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.get(&kind).copied().unwrap_or(0)
    }

    pub fn has_destructive(&self) -> bool {
        self.count(ActionKind::Delete) + self.count(ActionKind::Replace) > 0
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} resources (create {}, update {}, replace {}, delete {})",
            self.total,
            self.count(ActionKind::Create),
            self.count(ActionKind::Update),
            self.count(ActionKind::Replace),
            self.count(ActionKind::Delete),
        )?;
        if !self.resource_kinds.is_empty() {
            let kinds: Vec<&str> = self.resource_kinds.iter().map(String::as_str).collect();
            write!(f, "; kinds: {}", kinds.join(", "))?;
        }
        Ok(())
    }
}
