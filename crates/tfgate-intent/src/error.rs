//! Error types for intent classification

use thiserror::Error;

/// Intent classifier failures.
///
/// Never fatal to an evaluation: the aligner degrades every one of them to
/// an INDETERMINATE verdict.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// The classifier did not answer in time
    #[error("Intent classifier timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The classifier could not be reached
    #[error("Intent classifier unavailable: {reason}")]
    Unavailable { reason: String },

    /// The classifier answered with something unusable
    #[error("Invalid classifier response: {reason}")]
    InvalidResponse { reason: String },
}

/// Result type for intent classification
pub type Result<T> = std::result::Result<T, IntentError>;
