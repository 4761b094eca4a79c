//! Intent classification port and the deterministic keyword classifier

use std::collections::BTreeSet;

use async_trait::async_trait;
use tfgate_types::{ChangeSummary, IntentAssessment};

use crate::config::IntentConfig;
use crate::error::Result;

/// Classifies a declared intent against a structural change summary.
///
/// Implementations may call out to a model service; the aligner bounds
/// every call with a timeout and drops the future when it expires.
#[async_trait]
pub trait IntentClassifier: Send + Sync + std::fmt::Debug {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn classify(&self, intent: &str, summary: &ChangeSummary) -> Result<IntentAssessment>;
}

/// Vocabulary-based classifier.
///
/// An intent whose words are narrow (tags, labels, docs) and never broad is
/// a MISMATCH with confidence 1.0 when the summary destroys anything.
/// Every other case is ALIGNED with confidence 0.5.
#[derive(Debug, Clone)]
pub struct KeywordIntentClassifier {
    narrow: BTreeSet<String>,
    broad: BTreeSet<String>,
}

impl KeywordIntentClassifier {
    pub fn new<I, J, S, T>(narrow: I, broad: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            narrow: narrow.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
            broad: broad.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &IntentConfig) -> Self {
        Self::new(&config.narrow_terms, &config.broad_terms)
    }

    /// Narrow words found in `intent`, or `None` if it is not a narrow intent.
    fn narrow_terms<'a>(&self, words: &'a [String]) -> Option<BTreeSet<&'a str>> {
        if words.iter().any(|w| self.broad.contains(w)) {
            return None;
        }
        let narrow: BTreeSet<&str> = words
            .iter()
            .filter(|w| self.narrow.contains(*w))
            .map(String::as_str)
            .collect();
        if narrow.is_empty() {
            None
        } else {
            Some(narrow)
        }
    }

    /// Pure classification, shared by the async port.
    pub fn assess(&self, intent: &str, summary: &ChangeSummary) -> IntentAssessment {
        let words = tokenize(intent);
        match self.narrow_terms(&words) {
            Some(terms) if summary.has_destructive() => {
                let terms: Vec<&str> = terms.into_iter().collect();
                IntentAssessment::mismatch(
                    1.0,
                    format!(
                        "Declared intent suggests a narrow change ({}) but the plan destroys {} resource(s): {}",
                        terms.join(", "),
                        summary.destructive_addresses.len(),
                        summary.destructive_addresses.join(", ")
                    ),
                )
            }
            _ => IntentAssessment::aligned(
                0.5,
                format!("No contradiction found between intent and {}", summary),
            ),
        }
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::from_config(&IntentConfig::default())
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, intent: &str, summary: &ChangeSummary) -> Result<IntentAssessment> {
        Ok(self.assess(intent, summary))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfgate_types::{ActionSet, ChangeSet, IntentVerdict, KindTaxonomy, ResourceChange};

    fn summary(destructive: bool) -> ChangeSummary {
        let taxonomy = KindTaxonomy::default();
        let actions = if destructive {
            ActionSet::delete()
        } else {
            ActionSet::update()
        };
        ChangeSet::new(
            "1.6.2",
            vec![ResourceChange::new(
                "aws_db_instance.main",
                "aws_db_instance",
                actions,
                &taxonomy,
            )],
        )
        .unwrap()
        .summary()
    }

    #[tokio::test]
    async fn narrow_intent_with_destruction_is_mismatch() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier
            .classify("Update tags on the database", &summary(true))
            .await
            .unwrap();
        assert_eq!(result.verdict, IntentVerdict::Mismatch);
        assert_eq!(result.confidence, 1.0);
        assert!(result
            .explanation
            .unwrap()
            .contains("aws_db_instance.main"));
    }

    #[tokio::test]
    async fn narrow_intent_without_destruction_is_aligned() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier
            .classify("fix: typo in tags", &summary(false))
            .await
            .unwrap();
        assert_eq!(result.verdict, IntentVerdict::Aligned);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn broad_words_cancel_narrowness() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier.assess("Remove legacy DB and clean up tags", &summary(true));
        assert_eq!(result.verdict, IntentVerdict::Aligned);
    }

    #[test]
    fn custom_vocabulary_is_case_insensitive() {
        let classifier = KeywordIntentClassifier::new(["Badge"], ["Purge"]);
        let result = classifier.assess("BADGE refresh", &summary(true));
        assert_eq!(result.verdict, IntentVerdict::Mismatch);
    }

    #[test]
    fn repeated_narrow_words_are_listed_once() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier.assess("tags: fix typo in tags, then tags again", &summary(true));
        let explanation = result.explanation.unwrap();
        assert!(explanation.contains("(tags, typo)"), "{}", explanation);
    }

    #[test]
    fn rename_alone_is_not_narrow() {
        let classifier = KeywordIntentClassifier::default();
        let result = classifier.assess("rename the database and update its description", &summary(true));
        assert_eq!(result.verdict, IntentVerdict::Aligned);
    }
}
