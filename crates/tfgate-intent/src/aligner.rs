//! Timeout-bounded intent alignment

use std::sync::Arc;
use std::time::Duration;

use tfgate_types::{ChangeSummary, DegradedSignal, IntentAssessment};
use tracing::{debug, warn};

use crate::classifier::{IntentClassifier, KeywordIntentClassifier};
use crate::config::IntentConfig;
use crate::error::IntentError;

/// Assessment plus the degraded signal, if the verdict was not actually computed.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentAlignment {
    pub assessment: IntentAssessment,
    pub degraded: Option<DegradedSignal>,
}

/// Aligns declared intents through a classifier port.
///
/// Never fails: a missing intent, a timeout or a classifier error all yield
/// INDETERMINATE with confidence 0.
#[derive(Debug, Clone)]
pub struct IntentAligner {
    classifier: Arc<dyn IntentClassifier>,
    timeout: Duration,
}

impl IntentAligner {
    pub fn new(classifier: Arc<dyn IntentClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Keyword classifier with the configured vocabulary and timeout.
    pub fn from_config(config: &IntentConfig) -> Self {
        Self::new(
            Arc::new(KeywordIntentClassifier::from_config(config)),
            config.timeout(),
        )
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub async fn align(&self, declared_intent: Option<&str>, summary: &ChangeSummary) -> IntentAlignment {
        let Some(intent) = declared_intent.filter(|i| !i.trim().is_empty()) else {
            debug!("No declared intent, skipping alignment");
            return IntentAlignment {
                assessment: IntentAssessment::indeterminate("No intent declared"),
                degraded: Some(DegradedSignal::IntentNotDeclared),
            };
        };

        let call = self.classifier.classify(intent, summary);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(IntentError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(assessment) => {
                debug!(
                    classifier = %self.classifier.name(),
                    verdict = %assessment.verdict,
                    confidence = assessment.confidence,
                    "Intent classified"
                );
                IntentAlignment {
                    assessment,
                    degraded: None,
                }
            }
            Err(error) => {
                warn!(
                    classifier = %self.classifier.name(),
                    error = %error,
                    "Intent classifier unavailable, verdict is indeterminate"
                );
                IntentAlignment {
                    assessment: IntentAssessment::indeterminate(error.to_string()),
                    degraded: Some(DegradedSignal::IntentClassifierUnavailable),
                }
            }
        }
    }
}

impl Default for IntentAligner {
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}
