//! Error types for the core components.

use thiserror::Error;

/// Errors produced by the core components.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Both counter shards failed to allocate an id.
    #[error("id allocation failed on both counter shards: {reason}")]
    AllocationFailure {
        /// Failure detail from both shard attempts.
        reason: String,
    },

    /// A counter shard rejected or timed out an increment.
    #[error("counter shard {shard} unavailable: {reason}")]
    CounterUnavailable {
        /// Index of the failing shard (0 or 1).
        shard: usize,
        /// Underlying failure detail.
        reason: String,
    },

    /// A codec input exceeded its representable bound.
    #[error("{field} {value} exceeds maximum {max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value supplied by the caller.
        value: u64,
        /// Highest value the key format can carry.
        max: u64,
    },

    /// An opaque key failed tag or format validation.
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// A collaborator (document store or counter) could not serve a request.
    #[error("collaborator unreachable: {0}")]
    Unavailable(String),

    /// No cold-tier document exists for the requested id.
    #[error("object {id} not found in document store")]
    NotFound {
        /// Identifier the lookup was keyed on.
        id: u64,
    },
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
