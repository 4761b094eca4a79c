//! Deterministic classifier fakes for tests

use std::time::Duration;

use async_trait::async_trait;
use tfgate_types::{ChangeSummary, IntentAssessment};

use crate::classifier::IntentClassifier;
use crate::error::{IntentError, Result};

/// Always answers with a fixed assessment.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    assessment: IntentAssessment,
}

impl FixedClassifier {
    pub fn new(assessment: IntentAssessment) -> Self {
        Self { assessment }
    }
}

#[async_trait]
impl IntentClassifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn classify(&self, _intent: &str, _summary: &ChangeSummary) -> Result<IntentAssessment> {
        Ok(self.assessment.clone())
    }
}

/// Sleeps before answering ALIGNED, for exercising timeouts.
#[derive(Debug, Clone)]
pub struct SlowClassifier {
    delay: Duration,
}

impl SlowClassifier {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl IntentClassifier for SlowClassifier {
    fn name(&self) -> &str {
        "slow"
    }

    async fn classify(&self, _intent: &str, _summary: &ChangeSummary) -> Result<IntentAssessment> {
        tokio::time::sleep(self.delay).await;
        Ok(IntentAssessment::aligned(0.9, "eventually aligned"))
    }
}

/// Always unavailable.
#[derive(Debug, Clone)]
pub struct FailingClassifier {
    reason: String,
}

impl FailingClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IntentClassifier for FailingClassifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn classify(&self, _intent: &str, _summary: &ChangeSummary) -> Result<IntentAssessment> {
        Err(IntentError::Unavailable {
            reason: self.reason.clone(),
        })
    }
}
