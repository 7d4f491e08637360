//! Shared plain types and bounds for object identity and log locations.

/// Globally unique object identifier issued by the id allocator.
///
/// Ids are monotonically increasing within a counter shard and carry the
/// shard index in their low bit (`id % 2 == shard`).
pub type ObjectId = u64;

/// Partition number within the append-only log topic.
pub type PartitionId = u32;

/// Record offset within one log partition.
pub type LogOffset = u64;

/// Highest partition number representable in an opaque key.
pub const PARTITION_MAX: PartitionId = (1 << 10) - 1;

/// Number of partitions tracked by the tier router.
pub const PARTITION_COUNT: usize = PARTITION_MAX as usize + 1;

/// Bit width of the offset field inside the packed location word.
pub const OFFSET_BITS: u32 = 54;

/// Highest offset representable in an opaque key.
pub const OFFSET_MAX: LogOffset = (1 << OFFSET_BITS) - 1;

/// A single record's position in the append-only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Partition the record was appended to.
    pub partition: PartitionId,
    /// Offset of the record within that partition.
    pub offset: LogOffset,
}

impl Location {
    /// Creates a location from a partition/offset pair.
    pub fn new(partition: PartitionId, offset: LogOffset) -> Self {
        Self { partition, offset }
    }
}
