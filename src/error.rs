//! Error taxonomy for the object graph
//!
//! Every error is raised synchronously at the mutation that caused it.

/// Result type for object graph operations
pub type SbolResult<T> = Result<T, SbolError>;

/// Errors that can occur while building or mutating an SBOL document
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SbolError {
    /// Malformed URI, display id, or property value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A relative reference could not be resolved against any namespace
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Number of values is outside the declared bounds of a property
    #[error("Cardinality violation on <{predicate}>: {count} value(s), allowed {lower}..{upper}")]
    CardinalityViolation {
        predicate: String,
        count: usize,
        lower: usize,
        upper: String,
    },

    /// An entity of the wrong type was placed in a capability-constrained container
    #[error("Type mismatch: expected <{expected}>, found <{found}>")]
    TypeMismatch { expected: String, found: String },

    /// URI collision within a document
    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(String),

    /// Lookup or removal of an absent URI or value
    #[error("Not found: {0}")]
    NotFound(String),

    /// A validation rule is violated and no auto-correction applies
    #[error("Validation rule '{rule}' failed on <{entity}>: {message}")]
    ValidationError {
        rule: String,
        entity: String,
        message: String,
    },

    /// Auto-correction recursion exceeded its bound
    #[error("Validation cycle: rule '{rule}' on <{entity}> exceeded correction depth {depth}")]
    ValidationCycle {
        rule: String,
        entity: String,
        depth: usize,
    },
}

impl SbolError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SbolError::InvalidArgument(msg.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        SbolError::NotFound(what.into())
    }
}
