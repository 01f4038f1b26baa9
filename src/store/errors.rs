//! Error taxonomy for the configuration store
//!
//! Every store-layer failure maps to exactly one of four kinds so callers
//! can branch on it:
//! - NotFound: namespace/item/draft/published/rule absent where required
//! - InvalidArgument: malformed input, rejected before any mutation
//! - FailedPrecondition: operation requires state that does not hold
//! - Conflict: a mutation raced the per-key serialization contract

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Input was rejected before any mutation was attempted
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation's precondition does not hold
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// A concurrent mutation was detected on the same record
    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    /// Returns the stable string code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "NOT_FOUND",
            StoreError::InvalidArgument(_) => "INVALID_ARGUMENT",
            StoreError::FailedPrecondition(_) => "FAILED_PRECONDITION",
            StoreError::Conflict(_) => "CONFLICT",
        }
    }

    /// Maps a poisoned lock into the taxonomy.
    ///
    /// The per-key locking discipline should make this unreachable; it is
    /// kept detectable rather than panicking in a request path.
    pub fn poisoned(what: &str) -> Self {
        StoreError::Conflict(format!("lock poisoned: {}", what))
    }
}
