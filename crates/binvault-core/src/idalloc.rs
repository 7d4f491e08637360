//! Collision-free id allocation from two independent counter shards.
//!
//! Each shard is an atomic-increment service. An allocation picks one shard
//! at random, and on failure makes exactly one attempt on the other shard.
//! The issued id is `counter * 2 + shard`, so the id's parity names the
//! shard that produced it and the two shards can never collide.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::sync::Mutex;

use rand::Rng;

use crate::error::{CoreError, Result};
use crate::types::ObjectId;
use crate::BoxFuture;

/// Atomic counter collaborator, one per shard.
///
/// Implementations sit on a network connection pool with per-call
/// connect/read/write timeouts.
pub trait CounterBackend: Send + Sync {
    /// Atomically increments the named counter and returns the new value.
    fn increment(&self, key: &str) -> BoxFuture<'_, Result<u64>>;
}

/// Issues globally unique ids from two counter shards.
pub struct IdAllocator {
    shards: [Arc<dyn CounterBackend>; 2],
    counter_key: String,
}

impl IdAllocator {
    /// Creates an allocator over the even (index 0) and odd (index 1) shards.
    ///
    /// The counter key is derived from the configured key tag, matching the
    /// keyspace the opaque keys are issued under.
    pub fn new(even: Arc<dyn CounterBackend>, odd: Arc<dyn CounterBackend>, key_tag: &str) -> Self {
        Self {
            shards: [even, odd],
            counter_key: format!("{key_tag}_idalloc"),
        }
    }

    /// Allocates one globally unique id.
    ///
    /// Tries one random shard, then the other exactly once. Fails with
    /// [`CoreError::AllocationFailure`] only when both shards are
    /// unreachable.
    pub async fn allocate(&self) -> Result<ObjectId> {
        let first = rand::thread_rng().gen_range(0..2usize);
        let first_err = match self.try_shard(first).await {
            Ok(id) => return Ok(id),
            Err(e) => e,
        };
        let second = 1 - first;
        self.try_shard(second).await.map_err(|second_err| {
            CoreError::AllocationFailure {
                reason: format!("shard {first}: {first_err}; shard {second}: {second_err}"),
            }
        })
    }

    async fn try_shard(&self, shard: usize) -> Result<ObjectId> {
        let value = self.shards[shard]
            .increment(&self.counter_key)
            .await
            .map_err(|e| CoreError::CounterUnavailable {
                shard,
                reason: e.to_string(),
            })?;
        Ok(value * 2 + shard as u64)
    }
}

/// In-memory counter backend for tests and local development.
pub struct MemoryCounter {
    counters: Mutex<std::collections::HashMap<String, u64>>,
    fail: AtomicBool,
    increments: AtomicU64,
}

impl MemoryCounter {
    /// Creates an empty in-memory counter.
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(std::collections::HashMap::new()),
            fail: AtomicBool::new(false),
            increments: AtomicU64::new(0),
        }
    }

    /// Makes every subsequent increment fail (simulates an unreachable shard).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of successful increments served.
    pub fn increments(&self) -> u64 {
        self.increments.load(Ordering::SeqCst)
    }
}

impl Default for MemoryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterBackend for MemoryCounter {
    fn increment(&self, key: &str) -> BoxFuture<'_, Result<u64>> {
        let key = key.to_string();
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoreError::Unavailable("counter shard down".to_string()));
            }
            let mut counters = self.counters.lock().expect("counter mutex poisoned");
            let value = counters.entry(key).or_insert(0);
            *value += 1;
            self.increments.fetch_add(1, Ordering::SeqCst);
            Ok(*value)
        })
    }
}
