//! End-to-end decisions for representative change-sets

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use tfgate::{
    ids, BlastRadiusTier, ChangeSet, ContextSources, DegradedSignal, ExitClass, GateConfig,
    Gatekeeper, IntentVerdict, KindTaxonomy, PlanDocument, Severity, INTENT_ALIGNMENT,
};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Tuesday 2024-01-16, mid-morning UTC
fn business_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap()
}

fn gatekeeper() -> Gatekeeper {
    Gatekeeper::new(Arc::new(GateConfig::default())).unwrap()
}

fn entry(address: &str, kind: &str, actions: &[&str], before: Value, after: Value) -> Value {
    json!({
        "address": address,
        "type": kind,
        "change": { "actions": actions, "before": before, "after": after }
    })
}

fn plan(entries: Vec<Value>) -> ChangeSet {
    let document = json!({
        "format_version": "1.2",
        "terraform_version": "1.6.2",
        "prior_state": { "terraform_version": "1.6.2" },
        "resource_changes": entries,
    });
    let bytes = serde_json::to_vec(&document).unwrap();
    PlanDocument::from_json("plan", &bytes)
        .unwrap()
        .into_change_set(&KindTaxonomy::default())
        .unwrap()
}

fn instance(index: usize) -> Value {
    entry(
        &format!("aws_instance.app[{}]", index),
        "aws_instance",
        &["create"],
        Value::Null,
        json!({ "instance_type": "t3.small", "ami": "ami-0abc" }),
    )
}

/// Scenario C: three protected deletions and an open security group.
fn destructive_plan() -> ChangeSet {
    plan(vec![
        entry(
            "aws_db_instance.orders",
            "aws_db_instance",
            &["delete"],
            json!({ "engine": "postgres", "storage_encrypted": true }),
            Value::Null,
        ),
        entry(
            "aws_kms_key.orders",
            "aws_kms_key",
            &["delete"],
            json!({ "description": "orders key" }),
            Value::Null,
        ),
        entry(
            "aws_s3_bucket.exports",
            "aws_s3_bucket",
            &["delete"],
            json!({ "bucket": "orders-exports" }),
            Value::Null,
        ),
        entry(
            "aws_security_group.orders",
            "aws_security_group",
            &["update"],
            json!({ "name": "orders", "ingress": [] }),
            json!({
                "name": "orders",
                "ingress": [{
                    "protocol": "tcp",
                    "from_port": 0,
                    "to_port": 65535,
                    "cidr_blocks": ["0.0.0.0/0"]
                }]
            }),
        ),
    ])
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_small_compute_rollout_is_green() {
    let change_set = plan((0..3).map(instance).collect());
    let decision = gatekeeper()
        .evaluate(&change_set, ContextSources::at(business_hours()))
        .await;

    assert_eq!(decision.tier(), BlastRadiusTier::Green);
    assert_eq!(decision.deny_count(), 0);
    assert!(!decision.blocked());
    assert_eq!(decision.exit_class(), ExitClass::Ok);
    assert_eq!(decision.exit_code(), 0);
}

#[tokio::test]
async fn scenario_b_load_balancer_replace_is_yellow() {
    let mut entries: Vec<Value> = (0..8).map(instance).collect();
    entries.push(entry(
        "aws_lb.public",
        "aws_lb",
        &["delete", "create"],
        json!({ "name": "public", "internal": false }),
        json!({ "name": "public", "internal": true }),
    ));
    let change_set = plan(entries);
    assert_eq!(change_set.len(), 9);

    let decision = gatekeeper()
        .evaluate(&change_set, ContextSources::at(business_hours()))
        .await;

    assert_eq!(decision.tier(), BlastRadiusTier::Yellow);
    assert_eq!(decision.deny_count(), 0);
    assert!(!decision.blocked());
    assert_eq!(decision.exit_class(), ExitClass::Ok);
    assert_eq!(decision.breakdown().replace, 1);
}

#[tokio::test]
async fn scenario_c_protected_deletions_block() {
    let decision = gatekeeper()
        .evaluate(
            &destructive_plan(),
            ContextSources::at(business_hours()).with_declared_intent("update tags"),
        )
        .await;

    assert_eq!(decision.tier(), BlastRadiusTier::Red);
    assert!(decision.deny_count() >= 4);
    assert_eq!(decision.intent_verdict(), IntentVerdict::Mismatch);
    assert!(decision.blocked());
    assert_eq!(decision.exit_class(), ExitClass::PolicyBlock);

    let protected: Vec<_> = decision
        .findings_with(Severity::Deny)
        .filter(|f| f.rule_id == ids::PROTECTED_RESOURCE_DELETION)
        .filter_map(|f| f.subject_address.as_deref())
        .collect();
    assert_eq!(
        protected,
        vec![
            "aws_db_instance.orders",
            "aws_kms_key.orders",
            "aws_s3_bucket.exports"
        ]
    );
    assert!(decision
        .findings_with(Severity::Deny)
        .any(|f| f.rule_id == ids::OPEN_NETWORK_EXPOSURE
            && f.subject_address.as_deref() == Some("aws_security_group.orders")));
}

#[tokio::test]
async fn scenario_d_break_glass_keeps_evidence() {
    let gate = gatekeeper();
    let sources = ContextSources::at(business_hours()).with_declared_intent("update tags");

    let blocked = gate.evaluate(&destructive_plan(), sources.clone()).await;
    let overridden = gate
        .evaluate(
            &destructive_plan(),
            sources.with_emergency_override(Some("INC-4711".to_string())),
        )
        .await;

    assert!(!overridden.blocked());
    assert_eq!(overridden.exit_class(), ExitClass::BreakGlass);
    assert_eq!(overridden.exit_code(), 42);
    assert_eq!(overridden.findings(), blocked.findings());
    assert_eq!(overridden.override_reason(), Some("INC-4711"));
}

// ---------------------------------------------------------------------------
// Cross-cutting behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn identical_inputs_give_byte_identical_decisions() {
    let gate = gatekeeper();
    let sources = ContextSources::at(business_hours()).with_declared_intent("update tags");

    let first = gate.evaluate(&destructive_plan(), sources.clone()).await;
    let second = gate.evaluate(&destructive_plan(), sources).await;

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
}

#[tokio::test]
async fn malformed_resource_does_not_silence_other_rules() {
    let change_set = plan(vec![
        entry(
            "aws_db_instance.legacy",
            "aws_db_instance",
            &["delete"],
            json!({ "engine": "mysql" }),
            Value::Null,
        ),
        // ingress must be a list; this resource cannot be analysed
        entry(
            "aws_security_group.broken",
            "aws_security_group",
            &["update"],
            json!({ "name": "broken" }),
            json!({ "name": "broken", "ingress": "0.0.0.0/0" }),
        ),
    ]);

    let decision = gatekeeper()
        .evaluate(&change_set, ContextSources::at(business_hours()))
        .await;

    assert!(decision
        .findings_with(Severity::Deny)
        .any(|f| f.rule_id == ids::PROTECTED_RESOURCE_DELETION
            && f.subject_address.as_deref() == Some("aws_db_instance.legacy")));
    assert!(decision.findings_with(Severity::Warn).any(|f| {
        f.rule_id == ids::OPEN_NETWORK_EXPOSURE
            && f.subject_address.as_deref() == Some("aws_security_group.broken")
            && f.message.starts_with("rule evaluation failed")
    }));
    assert_eq!(decision.exit_class(), ExitClass::PolicyBlock);
}

#[tokio::test]
async fn friday_afternoon_escalates_one_step() {
    // 2024-01-19 is a Friday
    let friday = Utc.with_ymd_and_hms(2024, 1, 19, 16, 0, 0).unwrap();
    let change_set = plan((0..3).map(instance).collect());

    let decision = gatekeeper()
        .evaluate(&change_set, ContextSources::at(friday))
        .await;

    assert_eq!(decision.classified_tier(), BlastRadiusTier::Green);
    assert_eq!(decision.tier(), BlastRadiusTier::Yellow);
    assert!(decision
        .findings_with(Severity::Info)
        .any(|f| f.rule_id == ids::SENSITIVE_WINDOW));
    assert_eq!(decision.exit_class(), ExitClass::Ok);
}

#[tokio::test]
async fn mandatory_intent_without_declaration_blocks() {
    let mut config = GateConfig::default();
    config.intent.mandatory = true;
    let gate = Gatekeeper::new(Arc::new(config)).unwrap();

    let decision = gate
        .evaluate(
            &plan((0..2).map(instance).collect()),
            ContextSources::at(business_hours()),
        )
        .await;

    assert_eq!(decision.intent_verdict(), IntentVerdict::Indeterminate);
    assert_eq!(decision.exit_class(), ExitClass::IntentMismatch);
    assert!(decision
        .degraded_signals()
        .contains(&DegradedSignal::IntentNotDeclared));
    assert!(decision
        .findings()
        .iter()
        .any(|f| f.rule_id == INTENT_ALIGNMENT));
}

#[tokio::test]
async fn version_skew_is_informational() {
    let document = json!({
        "terraform_version": "1.7.0",
        "prior_state": { "terraform_version": "1.6.2" },
        "resource_changes": [instance(0)],
    });
    let change_set = PlanDocument::from_json("plan", &serde_json::to_vec(&document).unwrap())
        .unwrap()
        .into_change_set(&KindTaxonomy::default())
        .unwrap();

    let decision = gatekeeper()
        .evaluate(&change_set, ContextSources::at(business_hours()))
        .await;

    let skew: Vec<_> = decision
        .findings()
        .iter()
        .filter(|f| f.rule_id == ids::TOOL_VERSION_SKEW)
        .collect();
    assert_eq!(skew.len(), 1);
    assert_eq!(skew[0].severity, Severity::Info);
    assert!(skew[0].message.contains("1.7.0"));
    assert_eq!(decision.tier(), BlastRadiusTier::Green);
    assert_eq!(decision.exit_class(), ExitClass::Ok);
}
