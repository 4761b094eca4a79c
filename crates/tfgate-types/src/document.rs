//! Planning-tool document ingestion
//!
//! Plan and drift documents share the planning tool's JSON shape. Plan
//! documents become a validated [`ChangeSet`]; drift documents become a
//! [`DriftScan`], the set of addresses changed out-of-band.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::change::{
    value_kind, Action, ActionSet, Attributes, ChangeSet, KindTaxonomy, ResourceChange,
};
use crate::error::{GateError, Result};

/// Raw plan document as emitted by the planning tool.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDocument {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_changes: Option<Vec<RawResourceChange>>,
    #[serde(default)]
    pub resource_drift: Option<Vec<RawResourceChange>>,
    #[serde(default)]
    pub prior_state: Option<PriorState>,
}

/// Metadata of the state the plan was computed against.
#[derive(Debug, Clone, Deserialize)]
pub struct PriorState {
    #[serde(default)]
    pub terraform_version: Option<String>,
}

/// One raw resource change record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResourceChange {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub change: Option<RawChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChange {
    #[serde(default)]
    pub actions: Option<Vec<String>>,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

impl PlanDocument {
    /// Parse a JSON document.
    pub fn from_json(document: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| GateError::Unparseable {
            document: document.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the document into a change-set.
    ///
    /// Entries that are pure `no-op`, `read` or `forget` leave the real
    /// infrastructure untouched and are skipped.
    pub fn into_change_set(self, taxonomy: &KindTaxonomy) -> Result<ChangeSet> {
        let tool_version = self
            .terraform_version
            .ok_or_else(|| GateError::missing("terraform_version", None))?;
        let raw_changes = self
            .resource_changes
            .ok_or_else(|| GateError::missing("resource_changes", None))?;

        let mut changes = Vec::with_capacity(raw_changes.len());
        let mut skipped = 0usize;
        for (index, raw) in raw_changes.into_iter().enumerate() {
            match raw.into_resource_change(index, taxonomy)? {
                Some(change) => changes.push(change),
                None => skipped += 1,
            }
        }
        debug!(
            changes = changes.len(),
            skipped,
            tool_version = %tool_version,
            "Ingested plan document"
        );

        let mut change_set = ChangeSet::new(tool_version, changes)?;
        if let Some(at) = self.timestamp {
            change_set = change_set.with_generated_at(at);
        }
        if let Some(version) = self.prior_state.and_then(|p| p.terraform_version) {
            change_set = change_set.with_prior_applied_version(version);
        }
        Ok(change_set)
    }
}

impl RawResourceChange {
    fn into_resource_change(
        self,
        index: usize,
        taxonomy: &KindTaxonomy,
    ) -> Result<Option<ResourceChange>> {
        let context = || Some(format!("resource_changes[{}]", index));
        let address = self
            .address
            .filter(|a| !a.is_empty())
            .ok_or_else(|| GateError::missing("address", context()))?;
        let kind = self
            .kind
            .ok_or_else(|| GateError::missing("type", Some(address.clone())))?;
        let change = self
            .change
            .ok_or_else(|| GateError::missing("change", Some(address.clone())))?;
        let raw_actions = change
            .actions
            .ok_or_else(|| GateError::missing("change.actions", Some(address.clone())))?;

        if is_passive(&raw_actions) {
            return Ok(None);
        }

        let mut actions = Vec::with_capacity(raw_actions.len());
        for raw in &raw_actions {
            let action = Action::parse(raw).ok_or_else(|| GateError::UnknownAction {
                address: address.clone(),
                action: raw.clone(),
            })?;
            actions.push(action);
        }
        let actions = ActionSet::new(&address, actions)?;

        let mut resource = ResourceChange::new(address.clone(), kind, actions, taxonomy);
        if let Some(before) = attributes(change.before, &address, "change.before")? {
            resource = resource.with_before(before);
        }
        if let Some(after) = attributes(change.after, &address, "change.after")? {
            resource = resource.with_after(after);
        }
        Ok(Some(resource))
    }
}

fn is_passive(actions: &[String]) -> bool {
    matches!(
        actions
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .as_slice(),
        ["no-op"] | ["read"] | ["forget"]
    )
}

fn attributes(value: Option<Value>, address: &str, field: &str) -> Result<Option<Attributes>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.into_iter().collect())),
        Some(other) => Err(GateError::Unparseable {
            document: "plan".into(),
            reason: format!(
                "{} of {} must be an object, found {}",
                field,
                address,
                value_kind(&other)
            ),
        }),
    }
}

/// Addresses changed out-of-band, from a refresh-only drift document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftScan {
    drifted: BTreeSet<String>,
}

impl DriftScan {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            drifted: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Extract drifted addresses from a drift document.
    ///
    /// Uses `resource_drift` when present, `resource_changes` otherwise. An
    /// entry counts as drift when it is not a `read` and its before-state
    /// differs from its after-state.
    pub fn from_document(document: PlanDocument) -> Result<Self> {
        let entries = document
            .resource_drift
            .or(document.resource_changes)
            .ok_or_else(|| GateError::missing("resource_drift", Some("drift document".into())))?;

        let mut drifted = BTreeSet::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let address = entry
                .address
                .filter(|a| !a.is_empty())
                .ok_or_else(|| GateError::missing("address", Some(format!("drift[{}]", index))))?;
            let Some(change) = entry.change else {
                continue;
            };
            let is_read = change
                .actions
                .as_deref()
                .is_some_and(|a| a.iter().all(|s| s == "read"));
            if !is_read && change.before != change.after {
                drifted.insert(address);
            }
        }
        Ok(Self { drifted })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.drifted.contains(address)
    }

    pub fn addresses(&self) -> &BTreeSet<String> {
        &self.drifted
    }

    pub fn is_empty(&self) -> bool {
        self.drifted.is_empty()
    }

    /// Addresses present both in this scan and in the change-set.
    pub fn conflicts_with(&self, change_set: &ChangeSet) -> BTreeSet<String> {
        change_set
            .addresses()
            .filter(|a| self.drifted.contains(*a))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ActionKind, SensitivityTag};
    use serde_json::json;

    fn parse(value: Value) -> Result<ChangeSet> {
        let bytes = serde_json::to_vec(&value).unwrap();
        PlanDocument::from_json("plan", &bytes)?.into_change_set(&KindTaxonomy::default())
    }

    #[test]
    fn ingests_plan_and_skips_passive_entries() {
        let set = parse(json!({
            "terraform_version": "1.6.2",
            "timestamp": "2024-01-15T10:00:00Z",
            "prior_state": { "terraform_version": "1.5.7" },
            "resource_changes": [
                {
                    "address": "aws_db_instance.main",
                    "type": "aws_db_instance",
                    "change": { "actions": ["delete", "create"], "before": {"engine": "postgres"}, "after": {"engine": "postgres"} }
                },
                {
                    "address": "data.aws_ami.ubuntu",
                    "type": "aws_ami",
                    "change": { "actions": ["read"] }
                },
                {
                    "address": "aws_instance.idle",
                    "type": "aws_instance",
                    "change": { "actions": ["no-op"], "before": {}, "after": {} }
                }
            ]
        }))
        .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.tool_version, "1.6.2");
        assert_eq!(set.prior_applied_version.as_deref(), Some("1.5.7"));
        assert!(set.generated_at.is_some());

        let db = set.get("aws_db_instance.main").unwrap();
        assert_eq!(db.kind(), ActionKind::Replace);
        assert_eq!(db.sensitivity, SensitivityTag::Stateful);
        assert!(db.after_attribute("engine").is_some());
    }

    #[test]
    fn missing_tool_version_is_malformed() {
        let err = parse(json!({ "resource_changes": [] })).unwrap_err();
        assert!(matches!(err, GateError::MissingField { ref field, .. } if field == "terraform_version"));
    }

    #[test]
    fn forget_only_drops_state_and_is_skipped() {
        let set = parse(json!({
            "terraform_version": "1.7.0",
            "resource_changes": [
                { "address": "aws_instance.legacy", "type": "aws_instance", "change": { "actions": ["forget"], "before": {"ami": "ami-1"}, "after": null } },
                { "address": "aws_instance.web", "type": "aws_instance", "change": { "actions": ["create"], "after": {"ami": "ami-2"} } }
            ]
        }))
        .unwrap();

        assert_eq!(set.len(), 1);
        assert!(set.get("aws_instance.legacy").is_none());
        assert!(set.get("aws_instance.web").is_some());
    }

    #[test]
    fn unknown_action_is_malformed() {
        let err = parse(json!({
            "terraform_version": "1.6.2",
            "resource_changes": [
                { "address": "aws_instance.a", "type": "aws_instance", "change": { "actions": ["explode"] } }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, GateError::UnknownAction { .. }));
    }

    #[test]
    fn duplicate_address_is_malformed() {
        let entry = json!({ "address": "aws_instance.a", "type": "aws_instance", "change": { "actions": ["create"] } });
        let err = parse(json!({
            "terraform_version": "1.6.2",
            "resource_changes": [entry.clone(), entry]
        }))
        .unwrap_err();
        assert!(matches!(err, GateError::DuplicateAddress { .. }));
    }

    #[test]
    fn non_object_attributes_are_unparseable() {
        let err = parse(json!({
            "terraform_version": "1.6.2",
            "resource_changes": [
                { "address": "aws_instance.a", "type": "aws_instance", "change": { "actions": ["create"], "after": [1, 2] } }
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, GateError::Unparseable { .. }));
    }

    #[test]
    fn drift_scan_keeps_only_changed_entries() {
        let doc: PlanDocument = serde_json::from_value(json!({
            "resource_drift": [
                { "address": "aws_security_group.web", "change": { "actions": ["update"], "before": {"a": 1}, "after": {"a": 2} } },
                { "address": "aws_instance.same", "change": { "actions": ["no-op"], "before": {"a": 1}, "after": {"a": 1} } },
                { "address": "data.aws_ami.x", "change": { "actions": ["read"], "before": null, "after": {"id": "ami"} } }
            ]
        }))
        .unwrap();

        let scan = DriftScan::from_document(doc).unwrap();
        assert!(scan.contains("aws_security_group.web"));
        assert!(!scan.contains("aws_instance.same"));
        assert!(!scan.contains("data.aws_ami.x"));
    }

    #[test]
    fn drift_conflicts_intersect_with_change_set() {
        let set = parse(json!({
            "terraform_version": "1.6.2",
            "resource_changes": [
                { "address": "aws_security_group.web", "type": "aws_security_group", "change": { "actions": ["update"], "after": {} } },
                { "address": "aws_instance.a", "type": "aws_instance", "change": { "actions": ["create"], "after": {} } }
            ]
        }))
        .unwrap();
        let scan = DriftScan::new(["aws_security_group.web", "aws_s3_bucket.logs"]);

        let conflicts = scan.conflicts_with(&set);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts.contains("aws_security_group.web"));
    }
}
