//! Error types for change-set ingestion and gate evaluation

use thiserror::Error;

/// Fatal errors of a gate evaluation.
///
/// Only malformed input aborts an evaluation. Every other fault degrades
/// into a finding or a verdict and is carried by the decision.
#[derive(Error, Debug)]
pub enum GateError {
    /// The same address appears more than once in a change-set
    #[error("malformed input: duplicate address {address}")]
    DuplicateAddress { address: String },

    /// A resource change carries no action
    #[error("malformed input: resource {address} has no actions")]
    EmptyActions { address: String },

    /// An action string outside the supported vocabulary
    #[error("malformed input: resource {address} has unknown action '{action}'")]
    UnknownAction { address: String, action: String },

    /// An action list that is not create, update, delete or a replace pair
    #[error("malformed input: resource {address} has invalid action combination {actions:?}")]
    InvalidActionCombination {
        address: String,
        actions: Vec<String>,
    },

    /// A required field is absent
    #[error("malformed input: missing required field '{field}'{}", context_suffix(.context))]
    MissingField {
        field: String,
        context: Option<String>,
    },

    /// A document could not be parsed at all
    #[error("malformed input: unparseable {document} document: {reason}")]
    Unparseable { document: String, reason: String },

    /// A document source could not be read
    #[error("failed to read {document} document: {source}")]
    Io {
        document: String,
        #[source]
        source: std::io::Error,
    },
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" in {}", ctx),
        None => String::new(),
    }
}

impl GateError {
    /// Whether the error is a structural validation failure of the input.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, GateError::Io { .. })
    }

    pub(crate) fn missing(field: impl Into<String>, context: Option<String>) -> Self {
        GateError::MissingField {
            field: field.into(),
            context,
        }
    }
}

/// Result type for change-set operations
pub type Result<T> = std::result::Result<T, GateError>;
