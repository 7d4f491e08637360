//! Hot/cold tier router.
//!
//! Tracks, per partition, the boundary offset the external migration
//! consumer has advanced to: its next-to-consume offset, read from the
//! coordination tree. A record at or beyond the boundary has not been
//! migrated yet and must be served from the log; anything below it lives
//! in the cold store. The boundary array is refreshed on a timer into a
//! scratch copy first, so the exclusive lock is held only for an
//! in-memory copy, never during network I/O. Refresh failures are
//! recoverable: reads continue against the last-known-good boundaries,
//! which is safe because boundaries only move forward and a stale value
//! can only cause an extra hot-tier read.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, warn};

use binvault_core::types::{LogOffset, PartitionId, PARTITION_COUNT, PARTITION_MAX};

use crate::coord::CoordinationBackend;
use crate::error::{BrokerError, Result};

/// Configuration for the tier router.
#[derive(Debug, Clone)]
pub struct TierRouterConfig {
    /// Coordination tree chroot prefix (may be empty).
    pub chroot: String,
    /// Consumer group name the migration consumer commits under.
    pub consumer_name: String,
    /// Topic whose offsets are tracked.
    pub topic: String,
    /// Sleep after a successful refresh.
    pub refresh_interval: Duration,
    /// Shorter sleep after a failed refresh.
    pub retry_interval: Duration,
}

impl Default for TierRouterConfig {
    fn default() -> Self {
        Self {
            chroot: String::new(),
            consumer_name: "binvault".to_string(),
            topic: "binvault".to_string(),
            refresh_interval: Duration::from_secs(10),
            retry_interval: Duration::from_secs(1),
        }
    }
}

/// Per-partition migration boundary tracker.
pub struct TierRouter {
    coord: Arc<dyn CoordinationBackend>,
    offsets_path: String,
    boundaries: RwLock<Vec<LogOffset>>,
    config: TierRouterConfig,
}

impl TierRouter {
    /// Creates a router with all boundaries at zero (everything hot).
    pub fn new(coord: Arc<dyn CoordinationBackend>, config: TierRouterConfig) -> Self {
        let offsets_path = format!(
            "{}/consumers/{}/offsets/{}",
            config.chroot, config.consumer_name, config.topic
        );
        Self {
            coord,
            offsets_path,
            boundaries: RwLock::new(vec![0; PARTITION_COUNT]),
            config,
        }
    }

    /// Pulls the consumer's committed offsets from the coordination tree.
    ///
    /// A missing offsets path means the consumer has not committed yet;
    /// that is zero updates, not an error. All network reads land in a
    /// scratch copy; the live array is replaced under one short write-lock
    /// acquisition.
    pub async fn refresh(&self) -> Result<()> {
        let children = match self.coord.list_children(&self.offsets_path).await? {
            Some(children) => children,
            None => return Ok(()),
        };
        if children.is_empty() {
            return Ok(());
        }

        let mut scratch = self.boundaries.read().clone();
        for node in &children {
            let partition: usize = node.parse().map_err(|_| {
                BrokerError::Coordination(format!("offset node {node:?} is not a partition number"))
            })?;
            if partition >= PARTITION_COUNT {
                return Err(BrokerError::Coordination(format!(
                    "offset node names partition {partition}, beyond maximum {PARTITION_MAX}"
                )));
            }
            let raw = self.coord.get(&format!("{}/{node}", self.offsets_path)).await?;
            let text = std::str::from_utf8(&raw).map_err(|_| {
                BrokerError::Coordination(format!("offset for partition {partition} is not utf-8"))
            })?;
            let offset: LogOffset = text.trim().parse().map_err(|_| {
                BrokerError::Coordination(format!(
                    "offset for partition {partition} is not an integer: {text:?}"
                ))
            })?;
            scratch[partition] = offset;
        }

        let mut live = self.boundaries.write();
        live.copy_from_slice(&scratch);
        Ok(())
    }

    /// Periodic refresh loop.
    ///
    /// Sleeps the refresh interval after success and the retry interval
    /// after a failure; a failed cycle never touches the live boundaries.
    pub async fn run(self: Arc<Self>) {
        loop {
            match self.refresh().await {
                Ok(()) => {
                    debug!("tier boundaries refreshed");
                    tokio::time::sleep(self.config.refresh_interval).await;
                }
                Err(e) => {
                    warn!("tier boundary refresh failed, keeping last known: {e}");
                    tokio::time::sleep(self.config.retry_interval).await;
                }
            }
        }
    }

    /// Classifies a log position: true when the record has not been
    /// migrated and must be served from the log.
    ///
    /// The boundary is the consumer's next offset to read, so equality
    /// means not yet migrated.
    pub fn is_hot(&self, partition: PartitionId, offset: LogOffset) -> Result<bool> {
        if partition > PARTITION_MAX {
            return Err(BrokerError::PartitionOutOfRange {
                partition,
                max: PARTITION_MAX,
            });
        }
        let boundaries = self.boundaries.read();
        Ok(offset >= boundaries[partition as usize])
    }

    /// Current boundary for one partition.
    pub fn boundary(&self, partition: PartitionId) -> Result<LogOffset> {
        if partition > PARTITION_MAX {
            return Err(BrokerError::PartitionOutOfRange {
                partition,
                max: PARTITION_MAX,
            });
        }
        Ok(self.boundaries.read()[partition as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::MemoryCoordination;

    fn router_over(coord: Arc<MemoryCoordination>) -> TierRouter {
        TierRouter::new(
            coord,
            TierRouterConfig {
                chroot: "/binvault".to_string(),
                ..TierRouterConfig::default()
            },
        )
    }

    fn offsets_path() -> &'static str {
        "/binvault/consumers/binvault/offsets/binvault"
    }

    #[tokio::test]
    async fn test_boundary_semantics() {
        let coord = Arc::new(MemoryCoordination::new());
        coord.set(&format!("{}/5", offsets_path()), b"100");
        let router = router_over(coord);
        router.refresh().await.expect("refresh failed");

        assert!(!router.is_hot(5, 99).expect("is_hot failed"));
        assert!(router.is_hot(5, 100).expect("is_hot failed"));
        assert!(router.is_hot(5, 101).expect("is_hot failed"));
    }

    #[tokio::test]
    async fn test_everything_hot_before_first_commit() {
        let coord = Arc::new(MemoryCoordination::new());
        let router = router_over(coord);
        router.refresh().await.expect("refresh failed");
        assert!(router.is_hot(0, 0).expect("is_hot failed"));
        assert!(router.is_hot(1023, 0).expect("is_hot failed"));
    }

    #[tokio::test]
    async fn test_partition_out_of_range() {
        let coord = Arc::new(MemoryCoordination::new());
        let router = router_over(coord);
        let err = router.is_hot(1024, 0).unwrap_err();
        assert!(matches!(err, BrokerError::PartitionOutOfRange { partition: 1024, .. }));
    }

    #[tokio::test]
    async fn test_refresh_updates_only_named_partitions() {
        let coord = Arc::new(MemoryCoordination::new());
        coord.set(&format!("{}/2", offsets_path()), b"50");
        let router = router_over(coord.clone());
        router.refresh().await.expect("refresh failed");

        assert_eq!(router.boundary(2).expect("boundary"), 50);
        assert_eq!(router.boundary(3).expect("boundary"), 0);

        coord.set(&format!("{}/3", offsets_path()), b"10");
        router.refresh().await.expect("refresh failed");
        assert_eq!(router.boundary(2).expect("boundary"), 50);
        assert_eq!(router.boundary(3).expect("boundary"), 10);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_known_good() {
        let coord = Arc::new(MemoryCoordination::new());
        coord.set(&format!("{}/1", offsets_path()), b"70");
        let router = router_over(coord.clone());
        router.refresh().await.expect("refresh failed");
        assert_eq!(router.boundary(1).expect("boundary"), 70);

        coord.set_fail(true);
        assert!(router.refresh().await.is_err());
        assert_eq!(router.boundary(1).expect("boundary"), 70);
    }

    #[tokio::test]
    async fn test_garbage_offset_value_is_an_error() {
        let coord = Arc::new(MemoryCoordination::new());
        coord.set(&format!("{}/1", offsets_path()), b"not-a-number");
        let router = router_over(coord);
        assert!(router.refresh().await.is_err());
        assert_eq!(router.boundary(1).expect("boundary"), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_node_is_an_error() {
        let coord = Arc::new(MemoryCoordination::new());
        coord.set(&format!("{}/4096", offsets_path()), b"5");
        let router = router_over(coord);
        assert!(router.refresh().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_refreshes_on_timer() {
        let coord = Arc::new(MemoryCoordination::new());
        let router = Arc::new(router_over(coord.clone()));
        tokio::spawn(router.clone().run());

        coord.set(&format!("{}/0", offsets_path()), b"42");
        // Default refresh interval is 10s; paused time auto-advances.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(router.boundary(0).expect("boundary"), 42);
    }
}
