//! The evaluation pipeline
//!
//! classify → derive facts → escalate → (evaluate rules ∥ align intent) → decide

use std::sync::Arc;

use tracing::{debug, error, info_span, Instrument};

use tfgate_config::{GateConfig, Result as ConfigResult};
use tfgate_intent::{IntentAligner, IntentClassifier};
use tfgate_policy::PolicyEvaluator;
use tfgate_risk::{escalate, BlastRadiusClassifier, ContextEscalator, ContextSources};
use tfgate_types::{ChangeSet, Finding, Result, TierAssessment};

use crate::aggregator::{Decision, DecisionAggregator, Signals};
use crate::ports::{DocumentProvider, DriftSource};

/// Rule id of the finding emitted when the rule evaluation task itself dies.
pub const POLICY_EVALUATION: &str = "policy-evaluation";

/// Wires every component from one immutable configuration.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: Arc<GateConfig>,
    classifier: BlastRadiusClassifier,
    escalator: ContextEscalator,
    evaluator: Arc<PolicyEvaluator>,
    aligner: IntentAligner,
    aggregator: DecisionAggregator,
}

impl Gatekeeper {
    /// Build the pipeline, compiling the rule set once.
    pub fn new(config: Arc<GateConfig>) -> ConfigResult<Self> {
        let rules = config.rule_set()?;
        Ok(Self {
            classifier: BlastRadiusClassifier::new(config.blast_radius.clone()),
            escalator: ContextEscalator::new(config.temporal.clone()),
            evaluator: Arc::new(PolicyEvaluator::new(rules)),
            aligner: IntentAligner::from_config(&config.intent),
            aggregator: DecisionAggregator::new(config.intent.mandatory),
            config,
        })
    }

    /// Replace the keyword classifier, keeping the configured timeout.
    pub fn with_intent_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.aligner = IntentAligner::new(classifier, self.config.intent.timeout());
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    /// Fetch inputs through the ports, then evaluate.
    ///
    /// Fails only when a document is malformed or unreadable.
    pub async fn run(
        &self,
        documents: &dyn DocumentProvider,
        drift: &dyn DriftSource,
        mut sources: ContextSources,
    ) -> Result<Decision> {
        let change_set = documents
            .change_set(&self.config.blast_radius.taxonomy)
            .await?;
        sources.drift = drift.drift_scan().await?;
        debug!(
            documents = documents.name(),
            drift = drift.name(),
            drift_supplied = sources.drift.is_some(),
            "Collected evaluation inputs"
        );
        Ok(self.evaluate(&change_set, sources).await)
    }

    /// Evaluate a validated change-set. Always yields a complete decision.
    pub async fn evaluate(&self, change_set: &ChangeSet, sources: ContextSources) -> Decision {
        let span = info_span!(
            "gate_evaluation",
            tool_version = %change_set.tool_version,
            resources = change_set.len()
        );
        self.evaluate_inner(change_set, sources)
            .instrument(span)
            .await
    }

    async fn evaluate_inner(&self, change_set: &ChangeSet, sources: ContextSources) -> Decision {
        let report = self.classifier.classify(change_set);
        let facts = Arc::new(self.escalator.derive_facts(change_set, sources));
        let assessment = escalate(&TierAssessment::classified(report.tier), &facts);

        let policy = {
            let evaluator = Arc::clone(&self.evaluator);
            let change_set = change_set.clone();
            let facts = Arc::clone(&facts);
            tokio::task::spawn_blocking(move || evaluator.evaluate(&change_set, &facts))
        };
        let summary = change_set.summary();
        let alignment = self
            .aligner
            .align(facts.declared_intent.as_deref(), &summary);

        let (findings, intent) = tokio::join!(policy, alignment);
        let findings = findings.unwrap_or_else(|err| {
            error!(error = %err, "Policy evaluation task failed");
            vec![Finding::deny(
                POLICY_EVALUATION,
                format!("Policy evaluation aborted: {}", err),
            )]
        });

        self.aggregator.decide(
            Signals {
                assessment,
                report,
                findings,
                intent,
            },
            &facts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tfgate_intent::mocks::FixedClassifier;
    use tfgate_types::{
        ActionSet, BlastRadiusTier, DegradedSignal, DriftScan, ExitClass, IntentAssessment,
        IntentVerdict, KindTaxonomy, ResourceChange,
    };

    use crate::ports::{NoDriftSource, StaticDocumentProvider, StaticDriftSource};

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::new(Arc::new(GateConfig::default())).unwrap()
    }

    // Tuesday morning
    fn sources() -> ContextSources {
        ContextSources::at(Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap())
    }

    fn web_servers() -> ChangeSet {
        let taxonomy = KindTaxonomy::default();
        ChangeSet::new(
            "1.6.2",
            (0..2)
                .map(|i| {
                    ResourceChange::new(
                        format!("aws_instance.web[{}]", i),
                        "aws_instance",
                        ActionSet::create(),
                        &taxonomy,
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_small_change_is_green_and_ok() {
        let decision = gatekeeper().evaluate(&web_servers(), sources()).await;
        assert_eq!(decision.tier(), BlastRadiusTier::Green);
        assert_eq!(decision.exit_class(), ExitClass::Ok);
        assert!(decision
            .degraded_signals()
            .contains(&DegradedSignal::DriftScanUnavailable));
    }

    #[tokio::test]
    async fn test_drift_conflict_through_ports() {
        let decision = gatekeeper()
            .run(
                &StaticDocumentProvider::new(web_servers()),
                &StaticDriftSource::new(DriftScan::new(["aws_instance.web[1]"])),
                sources(),
            )
            .await
            .unwrap();
        assert_eq!(decision.tier(), BlastRadiusTier::Red);
        assert_eq!(decision.exit_class(), ExitClass::DriftConflict);
        assert!(decision.drift_conflicts().contains("aws_instance.web[1]"));
        assert!(!decision
            .degraded_signals()
            .contains(&DegradedSignal::DriftScanUnavailable));
    }

    #[tokio::test]
    async fn test_custom_classifier_is_used() {
        let mut config = GateConfig::default();
        config.intent.mandatory = true;
        let gate = Gatekeeper::new(Arc::new(config))
            .unwrap()
            .with_intent_classifier(Arc::new(FixedClassifier::new(IntentAssessment::mismatch(
                0.9, "model says no",
            ))));

        let decision = gate
            .run(
                &StaticDocumentProvider::new(web_servers()),
                &NoDriftSource,
                sources().with_declared_intent("add web servers"),
            )
            .await
            .unwrap();
        assert_eq!(decision.intent_verdict(), IntentVerdict::Mismatch);
        assert_eq!(decision.exit_class(), ExitClass::IntentMismatch);
    }

    #[test]
    fn test_invalid_rule_config_fails_construction() {
        let mut config = GateConfig::default();
        config.policy.production_patterns = vec!["(unclosed".to_string()];
        assert!(Gatekeeper::new(Arc::new(config)).is_err());
    }
}
