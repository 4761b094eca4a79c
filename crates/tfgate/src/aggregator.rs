//! Decision aggregation
//!
//! The aggregator is the only place where `blocked` and the exit class are
//! set. It combines the tier assessment, the rule findings and the intent
//! alignment with a fixed precedence and performs no I/O.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use tfgate_intent::IntentAlignment;
use tfgate_types::{
    sort_findings, BlastBreakdown, BlastRadiusReport, BlastRadiusTier, ContextFacts,
    DegradedSignal, EscalationReason, ExitClass, Finding, IntentAssessment, IntentVerdict,
    Severity, TierAssessment,
};

/// Rule id of findings attached by the aggregator for intent alignment.
pub const INTENT_ALIGNMENT: &str = "intent-alignment";

/// Everything the upstream components contributed to one evaluation.
#[derive(Debug, Clone)]
pub struct Signals {
    pub assessment: TierAssessment,
    pub report: BlastRadiusReport,
    pub findings: Vec<Finding>,
    pub intent: IntentAlignment,
}

/// Terminal outcome of an evaluation.
///
/// Produced once by [`DecisionAggregator::decide`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    tier: BlastRadiusTier,
    classified_tier: BlastRadiusTier,
    escalation_reasons: Vec<EscalationReason>,
    score: u32,
    breakdown: BlastBreakdown,
    findings: Vec<Finding>,
    intent: IntentAssessment,
    blocked: bool,
    exit_class: ExitClass,
    emergency_override: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    override_reason: Option<String>,
    drift_conflicts: BTreeSet<String>,
    degraded_signals: BTreeSet<DegradedSignal>,
    tool_version: String,
    evaluated_at: DateTime<Utc>,
}

impl Decision {
    /// Effective tier after escalation
    pub fn tier(&self) -> BlastRadiusTier {
        self.tier
    }

    /// Tier before escalation
    pub fn classified_tier(&self) -> BlastRadiusTier {
        self.classified_tier
    }

    pub fn escalation_reasons(&self) -> &[EscalationReason] {
        &self.escalation_reasons
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn breakdown(&self) -> &BlastBreakdown {
        &self.breakdown
    }

    /// Findings in report order
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn deny_count(&self) -> usize {
        self.findings_with(Severity::Deny).count()
    }

    pub fn intent(&self) -> &IntentAssessment {
        &self.intent
    }

    pub fn intent_verdict(&self) -> IntentVerdict {
        self.intent.verdict
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn exit_class(&self) -> ExitClass {
        self.exit_class
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_class.exit_code()
    }

    pub fn emergency_override(&self) -> bool {
        self.emergency_override
    }

    pub fn override_reason(&self) -> Option<&str> {
        self.override_reason.as_deref()
    }

    pub fn drift_conflicts(&self) -> &BTreeSet<String> {
        &self.drift_conflicts
    }

    /// Signal sources that were unavailable
    pub fn degraded_signals(&self) -> &BTreeSet<DegradedSignal> {
        &self.degraded_signals
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded_signals.is_empty()
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }
}

/// Combines signals into a [`Decision`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionAggregator {
    mandatory_intent: bool,
}

impl DecisionAggregator {
    pub fn new(mandatory_intent: bool) -> Self {
        Self { mandatory_intent }
    }

    pub fn mandatory_intent(&self) -> bool {
        self.mandatory_intent
    }

    /// Decide with precedence, first match wins:
    /// override, deny finding, drift conflict, mandatory intent, OK.
    pub fn decide(&self, signals: Signals, facts: &ContextFacts) -> Decision {
        let Signals {
            assessment,
            report,
            mut findings,
            intent,
        } = signals;

        let intent_blocks = self.intent_blocks(intent.assessment.verdict);
        if let Some(finding) = self.intent_finding(&intent.assessment, intent_blocks) {
            findings.push(finding);
        }
        sort_findings(&mut findings);

        let (blocked, exit_class) = if facts.emergency_override {
            (false, ExitClass::BreakGlass)
        } else if findings.iter().any(Finding::is_deny) {
            (true, ExitClass::PolicyBlock)
        } else if facts.has_drift_conflicts() {
            (true, ExitClass::DriftConflict)
        } else if intent_blocks {
            (true, ExitClass::IntentMismatch)
        } else {
            (false, ExitClass::Ok)
        };

        let decision = Decision {
            tier: assessment.effective,
            classified_tier: assessment.classified,
            escalation_reasons: assessment.reasons,
            score: report.score,
            breakdown: report.breakdown,
            findings,
            intent: intent.assessment,
            blocked,
            exit_class,
            emergency_override: facts.emergency_override,
            override_reason: facts.override_reason.clone(),
            drift_conflicts: facts.drift_conflicts.clone(),
            degraded_signals: degraded_signals(facts, intent.degraded),
            tool_version: facts.tool_version.clone(),
            evaluated_at: facts.evaluation_time,
        };
        log_decision(&decision);
        decision
    }

    fn intent_blocks(&self, verdict: IntentVerdict) -> bool {
        self.mandatory_intent && verdict != IntentVerdict::Aligned
    }

    fn intent_finding(&self, assessment: &IntentAssessment, blocks: bool) -> Option<Finding> {
        let explanation = assessment
            .explanation
            .as_deref()
            .unwrap_or("no explanation given");
        if blocks {
            Some(Finding::warn(
                INTENT_ALIGNMENT,
                format!(
                    "Intent verdict {} blocks because intent validation is mandatory: {}",
                    assessment.verdict, explanation
                ),
            ))
        } else if assessment.verdict == IntentVerdict::Mismatch {
            Some(Finding::warn(
                INTENT_ALIGNMENT,
                format!("Declared intent does not match the change-set: {}", explanation),
            ))
        } else {
            None
        }
    }
}

fn degraded_signals(
    facts: &ContextFacts,
    intent: Option<DegradedSignal>,
) -> BTreeSet<DegradedSignal> {
    let mut signals = BTreeSet::new();
    if !facts.drift_scan_supplied {
        signals.insert(DegradedSignal::DriftScanUnavailable);
    }
    if facts.prior_applied_version.is_none() {
        signals.insert(DegradedSignal::PriorVersionUnknown);
    }
    signals.extend(intent);
    signals
}

fn log_decision(decision: &Decision) {
    match decision.exit_class {
        ExitClass::Ok => {
            info!(
                tier = %decision.tier,
                score = decision.score,
                findings = decision.findings.len(),
                intent = %decision.intent.verdict,
                degraded = decision.degraded_signals.len(),
                "Change-set allowed"
            );
        }
        ExitClass::BreakGlass => {
            warn!(
                tier = %decision.tier,
                deny_findings = decision.deny_count(),
                reason = decision.override_reason.as_deref().unwrap_or("none given"),
                "Break-glass override, change-set allowed despite findings"
            );
        }
        blocking => {
            warn!(
                tier = %decision.tier,
                exit_class = %blocking,
                deny_findings = decision.deny_count(),
                drift_conflicts = decision.drift_conflicts.len(),
                intent = %decision.intent.verdict,
                "Change-set blocked"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn facts() -> ContextFacts {
        let at = Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap();
        ContextFacts::new(at, "1.6.2")
            .with_prior_applied_version("1.6.2")
            .with_drift_conflicts(Vec::<String>::new())
    }

    fn signals(findings: Vec<Finding>, verdict: IntentVerdict) -> Signals {
        let assessment = match verdict {
            IntentVerdict::Aligned => IntentAssessment::aligned(0.5, "fine"),
            IntentVerdict::Mismatch => IntentAssessment::mismatch(1.0, "tags only, but deletes"),
            IntentVerdict::Indeterminate => IntentAssessment::indeterminate("no answer"),
        };
        Signals {
            assessment: TierAssessment::classified(BlastRadiusTier::Green),
            report: BlastRadiusReport::default(),
            findings,
            intent: IntentAlignment {
                assessment,
                degraded: None,
            },
        }
    }

    #[test]
    fn test_clean_signals_are_ok() {
        let decision =
            DecisionAggregator::default().decide(signals(vec![], IntentVerdict::Aligned), &facts());
        assert!(!decision.blocked());
        assert_eq!(decision.exit_class(), ExitClass::Ok);
        assert!(!decision.is_degraded());
    }

    #[test]
    fn test_deny_finding_blocks() {
        let findings = vec![Finding::deny("protected-resource-deletion", "no").on("aws_kms_key.k")];
        let decision =
            DecisionAggregator::default().decide(signals(findings, IntentVerdict::Aligned), &facts());
        assert!(decision.blocked());
        assert_eq!(decision.exit_class(), ExitClass::PolicyBlock);
    }

    #[test]
    fn test_warn_and_info_do_not_block() {
        let findings = vec![
            Finding::warn("oversized-instance", "big"),
            Finding::info("tool-version-skew", "skew"),
        ];
        let decision =
            DecisionAggregator::default().decide(signals(findings, IntentVerdict::Aligned), &facts());
        assert!(!decision.blocked());
        assert_eq!(decision.findings().len(), 2);
    }

    #[test]
    fn test_drift_conflict_blocks_below_deny() {
        let facts = facts().with_drift_conflicts(["aws_instance.web"]);
        let decision =
            DecisionAggregator::default().decide(signals(vec![], IntentVerdict::Aligned), &facts);
        assert_eq!(decision.exit_class(), ExitClass::DriftConflict);

        let denied = DecisionAggregator::default().decide(
            signals(vec![Finding::deny("x", "no")], IntentVerdict::Aligned),
            &facts,
        );
        assert_eq!(denied.exit_class(), ExitClass::PolicyBlock);
    }

    #[test]
    fn test_advisory_mismatch_warns_without_blocking() {
        let decision =
            DecisionAggregator::new(false).decide(signals(vec![], IntentVerdict::Mismatch), &facts());
        assert!(!decision.blocked());
        assert_eq!(decision.findings().len(), 1);
        assert_eq!(decision.findings()[0].rule_id, INTENT_ALIGNMENT);
        assert_eq!(decision.findings()[0].severity, Severity::Warn);
    }

    #[test]
    fn test_mandatory_intent_blocks_mismatch_and_indeterminate() {
        let aggregator = DecisionAggregator::new(true);
        for verdict in [IntentVerdict::Mismatch, IntentVerdict::Indeterminate] {
            let decision = aggregator.decide(signals(vec![], verdict), &facts());
            assert!(decision.blocked());
            assert_eq!(decision.exit_class(), ExitClass::IntentMismatch);
            assert!(decision
                .findings()
                .iter()
                .any(|f| f.rule_id == INTENT_ALIGNMENT));
        }
        let aligned = aggregator.decide(signals(vec![], IntentVerdict::Aligned), &facts());
        assert_eq!(aligned.exit_class(), ExitClass::Ok);
    }

    #[test]
    fn test_override_keeps_every_finding() {
        let findings = vec![
            Finding::deny("protected-resource-deletion", "no").on("aws_db_instance.main"),
            Finding::deny("open-network-exposure", "open").on("aws_security_group.web"),
        ];
        let facts = facts().with_emergency_override(Some("INC-1234".into()));
        let decision = DecisionAggregator::new(true)
            .decide(signals(findings, IntentVerdict::Mismatch), &facts);
        assert!(!decision.blocked());
        assert_eq!(decision.exit_class(), ExitClass::BreakGlass);
        assert_eq!(decision.exit_code(), 42);
        assert_eq!(decision.deny_count(), 2);
        assert_eq!(decision.override_reason(), Some("INC-1234"));
    }

    #[test]
    fn test_missing_sources_are_reported_as_degraded() {
        let at = Utc.with_ymd_and_hms(2024, 1, 16, 10, 0, 0).unwrap();
        let bare = ContextFacts::new(at, "1.6.2");
        let mut input = signals(vec![], IntentVerdict::Indeterminate);
        input.intent.degraded = Some(DegradedSignal::IntentNotDeclared);

        let decision = DecisionAggregator::default().decide(input, &bare);
        let degraded: Vec<_> = decision.degraded_signals().iter().copied().collect();
        assert_eq!(
            degraded,
            vec![
                DegradedSignal::DriftScanUnavailable,
                DegradedSignal::PriorVersionUnknown,
                DegradedSignal::IntentNotDeclared,
            ]
        );
        assert_eq!(decision.exit_class(), ExitClass::Ok);
    }

    #[test]
    fn test_findings_come_out_sorted() {
        let findings = vec![
            Finding::info("tool-version-skew", "skew"),
            Finding::deny("b-rule", "b").on("z.addr"),
            Finding::warn("a-rule", "a"),
            Finding::deny("a-rule", "a").on("y.addr"),
        ];
        let decision =
            DecisionAggregator::default().decide(signals(findings, IntentVerdict::Aligned), &facts());
        let order: Vec<_> = decision
            .findings()
            .iter()
            .map(|f| (f.severity, f.rule_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::Deny, "a-rule"),
                (Severity::Deny, "b-rule"),
                (Severity::Warn, "a-rule"),
                (Severity::Info, "tool-version-skew"),
            ]
        );
    }
}
