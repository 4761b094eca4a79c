//! Error types for rule loading and rule evaluation

use thiserror::Error;

/// Rule set construction errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Two rules share an id
    #[error("Duplicate rule id: {rule_id}")]
    DuplicateRuleId { rule_id: String },

    /// A rule has an empty id
    #[error("Rule id must not be empty")]
    EmptyRuleId,

    /// A pattern failed to compile
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Invalid policy configuration
    #[error("Invalid policy configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

/// Result type for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// A rule predicate that could not be evaluated for one subject.
///
/// Never fatal: the evaluator reports it as a `warn` finding under the
/// failing rule's id and keeps going.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleFault {
    /// The after-state of a created or updated resource is absent
    #[error("after-state of {address} is missing")]
    MissingAfterState { address: String },

    /// A required attribute is absent
    #[error("attribute '{attribute}' of {address} is required")]
    MissingAttribute { address: String, attribute: String },

    /// An attribute has the wrong JSON type
    #[error("attribute '{attribute}' of {address} must be {expected}, found {found}")]
    UnexpectedType {
        address: String,
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A port number outside 0-65535
    #[error("attribute '{attribute}' of {address} is not a valid port: {value}")]
    InvalidPort {
        address: String,
        attribute: String,
        value: i64,
    },

    /// The predicate panicked
    #[error("rule panicked: {message}")]
    Panicked { message: String },
}
