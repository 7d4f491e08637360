//! Write/read orchestration.
//!
//! One write runs a fixed step order: fingerprint, dedup lookup, id
//! allocation, log produce, key encode, best-effort dedup insert. Dedup
//! failures are logged and skipped; every other failure aborts the
//! request and is reported to the caller. One read decodes the key, asks
//! the tier router which tier holds the record, and fetches from the log
//! or the cold store accordingly.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::context::{AppContext, Collaborators};
use crate::error::Result;
use crate::ServiceConfig;

/// Tiered content-addressable object store facade.
pub struct BinVault {
    ctx: Arc<AppContext>,
}

impl BinVault {
    /// Builds the full service from configuration and collaborators.
    pub fn new(config: &ServiceConfig, collab: Collaborators) -> Result<Self> {
        Ok(Self {
            ctx: AppContext::build(config, collab)?,
        })
    }

    /// Shared context, for callers that need direct component access.
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Stores one object and returns its opaque key.
    ///
    /// Identical content returns the previously issued key when the dedup
    /// index can see it; a degraded dedup index degrades to storing a
    /// fresh copy, never to failing the write.
    pub async fn put(&self, payload: &[u8]) -> Result<String> {
        let started = Instant::now();
        let ctx = &self.ctx;

        let mut scratch = ctx.buffers.get();
        scratch.extend_from_slice(payload);

        let fp = binvault_core::fingerprint::fingerprint(&scratch);
        match ctx.dedup.lookup(&fp).await {
            Ok(Some(key)) => {
                info!(
                    key = %key,
                    len = scratch.len(),
                    cost_us = started.elapsed().as_micros() as u64,
                    "dedup hit, returning existing key"
                );
                return Ok(key);
            }
            Ok(None) => {}
            Err(e) => warn!("dedup lookup failed, proceeding without dedup: {e}"),
        }

        let id = ctx.allocator.allocate().await?;
        let location = ctx.writer.produce(id, &scratch).await?;
        let key = ctx.codec.encode(id, location.partition, location.offset)?;

        if let Err(e) = ctx.dedup.insert(&fp, &key).await {
            warn!(id, key = %key, "dedup insert failed, future uploads will not dedup: {e}");
        }

        info!(
            id,
            key = %key,
            partition = location.partition,
            offset = location.offset,
            len = scratch.len(),
            cost_us = started.elapsed().as_micros() as u64,
            "stored object"
        );
        Ok(key)
    }

    /// Resolves an opaque key to the object bytes, from whichever tier
    /// currently holds them.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let started = Instant::now();
        let ctx = &self.ctx;

        let (id, location) = ctx.codec.decode(key)?;
        let hot = ctx.router.is_hot(location.partition, location.offset)?;
        let data = if hot {
            ctx.writer.fetch(location.partition, location.offset).await?
        } else {
            ctx.store.get_by_id(id).await?
        };

        info!(
            id,
            key = %key,
            tier = if hot { "hot" } else { "cold" },
            len = data.len(),
            cost_us = started.elapsed().as_micros() as u64,
            "served object"
        );
        Ok(data)
    }
}
