//! # tf-gate Intent
//!
//! Compares a declared intent, usually a commit message, with what a
//! change-set actually does.
//!
//! - [`IntentClassifier`]: the classification port
//! - [`KeywordIntentClassifier`]: deterministic vocabulary-based fallback
//! - [`IntentAligner`]: bounds every classifier call with a timeout and
//!   degrades to INDETERMINATE instead of failing
//! - [`mocks`]: classifier fakes for tests

pub mod aligner;
pub mod classifier;
pub mod config;
pub mod error;
pub mod mocks;

pub use aligner::{IntentAligner, IntentAlignment};
pub use classifier::{IntentClassifier, KeywordIntentClassifier};
pub use config::IntentConfig;
pub use error::{IntentError, Result};
