//! Error types for the log writer and tier router.

use thiserror::Error;

/// Errors produced by the log writer and tier router.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Every writable partition is either blocked or unavailable.
    #[error("no writable partition available")]
    NoWritablePartition,

    /// The log service rejected or timed out a produce request.
    #[error("produce failed on partition {partition}: {reason}")]
    ProduceFailure {
        /// Partition the record was destined for.
        partition: u32,
        /// Failure detail from the log service.
        reason: String,
    },

    /// The shared producer session or its worker is gone.
    #[error("producer session closed")]
    SessionClosed,

    /// No record exists at the requested log position.
    #[error("no record found at partition {partition} offset {offset}")]
    NotFound {
        /// Partition that was fetched.
        partition: u32,
        /// Offset within the partition.
        offset: u64,
    },

    /// A fetched record's envelope could not be unpacked.
    #[error("failed to decode record envelope: {reason}")]
    DecodeError {
        /// Why the envelope was rejected.
        reason: String,
    },

    /// A record envelope could not be serialized for produce.
    #[error("failed to encode record envelope: {reason}")]
    EncodeError {
        /// Underlying serialization failure.
        reason: String,
    },

    /// A tier lookup named a partition outside the tracked range.
    #[error("partition {partition} exceeds maximum {max}")]
    PartitionOutOfRange {
        /// Partition supplied by the caller.
        partition: u32,
        /// Highest tracked partition number.
        max: u32,
    },

    /// A write-disabled partition range in configuration is malformed.
    #[error("invalid partition range {spec:?}: {reason}")]
    InvalidPartitionRange {
        /// Range string as configured.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The log service could not serve a metadata or fetch request.
    #[error("log backend error: {0}")]
    Backend(String),

    /// The coordination service could not serve a request.
    #[error("coordination error: {0}")]
    Coordination(String),
}

/// Result alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;
