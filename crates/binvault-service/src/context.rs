//! Application context.
//!
//! Every long-lived singleton is constructed once here from configuration
//! and injected collaborators, then passed by reference into the
//! components that need it. There is no ambient global state.

use std::sync::Arc;

use binvault_broker::backend::LogBackend;
use binvault_broker::coord::CoordinationBackend;
use binvault_broker::partitions;
use binvault_broker::router::{TierRouter, TierRouterConfig};
use binvault_broker::writer::{LogWriter, LogWriterConfig};
use binvault_core::buffer::{ScratchPool, ScratchPoolConfig};
use binvault_core::dedup::DedupIndex;
use binvault_core::idalloc::{CounterBackend, IdAllocator};
use binvault_core::keycodec::KeyCodec;
use binvault_core::store::DocumentStore;

use crate::config::ServiceConfig;
use crate::error::Result;

/// External collaborator handles injected at startup.
///
/// Production wiring hands in real network clients; tests hand in the
/// in-memory implementations.
pub struct Collaborators {
    /// Counter shard issuing even ids.
    pub counter_even: Arc<dyn CounterBackend>,
    /// Counter shard issuing odd ids.
    pub counter_odd: Arc<dyn CounterBackend>,
    /// Document store backing dedup records and the cold tier.
    pub store: Arc<dyn DocumentStore>,
    /// Partitioned append-only log service.
    pub log: Arc<dyn LogBackend>,
    /// Coordination service holding the consumer's committed offsets.
    pub coord: Arc<dyn CoordinationBackend>,
}

/// Shared singletons for the write and read paths.
pub struct AppContext {
    /// Opaque key codec.
    pub codec: KeyCodec,
    /// Two-shard id allocator.
    pub allocator: IdAllocator,
    /// Fingerprint -> key dedup index.
    pub dedup: DedupIndex,
    /// Cold-tier document store.
    pub store: Arc<dyn DocumentStore>,
    /// Shared partitioned log writer.
    pub writer: LogWriter,
    /// Hot/cold tier router.
    pub router: Arc<TierRouter>,
    /// Per-request scratch-buffer pool.
    pub buffers: Arc<ScratchPool>,
}

impl AppContext {
    /// Wires every component from configuration and collaborators, and
    /// starts the background boundary-refresh loop.
    pub fn build(config: &ServiceConfig, collab: Collaborators) -> Result<Arc<Self>> {
        let codec = KeyCodec::new(&config.keys.tag, &config.keys.secret);
        let allocator = IdAllocator::new(collab.counter_even, collab.counter_odd, &config.keys.tag);
        let dedup = DedupIndex::new(collab.store.clone());

        let disabled = partitions::parse_disabled_ranges(&config.broker.write_disabled_partitions)?;
        let writer = LogWriter::start(
            collab.log,
            LogWriterConfig {
                topic: config.broker.topic.clone(),
                queue_capacity: config.broker.queue_capacity,
                disabled_partitions: disabled,
            },
        )?;

        let router = Arc::new(TierRouter::new(
            collab.coord,
            TierRouterConfig {
                chroot: config.coordination.chroot.clone(),
                consumer_name: config.coordination.consumer_name.clone(),
                topic: config.broker.topic.clone(),
                refresh_interval: config.refresh_interval(),
                retry_interval: config.retry_interval(),
            },
        ));
        tokio::spawn(router.clone().run());

        let buffers = ScratchPool::new(ScratchPoolConfig {
            max_retained_size: config.buffers.max_retained_size,
            max_pooled: config.buffers.max_pooled,
        });

        Ok(Arc::new(Self {
            codec,
            allocator,
            dedup,
            store: collab.store,
            writer,
            router,
            buffers,
        }))
    }
}
