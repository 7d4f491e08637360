//! Scratch-buffer reuse pool for per-request ingest buffers.
//!
//! Buffers are drawn on the write path, filled with the inbound payload,
//! and returned on drop. Retention is bounded by a size ceiling: a buffer
//! whose capacity grew beyond the ceiling is discarded instead of pooled,
//! so one oversized upload cannot pin memory for the life of the process.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Configuration for the scratch-buffer pool.
#[derive(Debug, Clone)]
pub struct ScratchPoolConfig {
    /// Capacity above which a returned buffer is dropped instead of pooled.
    pub max_retained_size: usize,
    /// Maximum number of idle buffers kept.
    pub max_pooled: usize,
}

impl Default for ScratchPoolConfig {
    fn default() -> Self {
        Self {
            max_retained_size: 2 * 1024 * 1024,
            max_pooled: 64,
        }
    }
}

/// Counters describing pool behavior.
#[derive(Debug, Clone, Default)]
pub struct ScratchPoolStats {
    /// Buffers handed out from the idle list.
    pub reused: u64,
    /// Buffers freshly allocated because the idle list was empty.
    pub allocated: u64,
    /// Buffers dropped on return because they exceeded the ceiling.
    pub discarded: u64,
}

/// Bounded pool of reusable byte buffers.
pub struct ScratchPool {
    config: ScratchPoolConfig,
    idle: Mutex<VecDeque<Vec<u8>>>,
    reused: AtomicU64,
    allocated: AtomicU64,
    discarded: AtomicU64,
}

impl ScratchPool {
    /// Creates an empty pool with the given retention policy.
    pub fn new(config: ScratchPoolConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            idle: Mutex::new(VecDeque::new()),
            reused: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        })
    }

    /// Draws a cleared buffer from the pool, allocating if none is idle.
    pub fn get(self: &Arc<Self>) -> ScratchBuffer {
        let recycled = self.idle.lock().unwrap().pop_front();
        let buf = match recycled {
            Some(buf) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                buf
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        };
        ScratchBuffer {
            buf: Some(buf),
            pool: Arc::clone(self),
        }
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> ScratchPoolStats {
        ScratchPoolStats {
            reused: self.reused.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Number of idle buffers currently held.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap().len()
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        buf.clear();
        if buf.capacity() > self.config.max_retained_size {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let mut idle = self.idle.lock().unwrap();
        if idle.len() < self.config.max_pooled {
            idle.push_back(buf);
        } else {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A buffer borrowed from the pool. Returns to the pool on drop.
pub struct ScratchBuffer {
    buf: Option<Vec<u8>>,
    pool: Arc<ScratchPool>,
}

impl Deref for ScratchBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        match &self.buf {
            Some(buf) => buf,
            None => unreachable!("buffer taken before drop"),
        }
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.buf {
            Some(buf) => buf,
            None => unreachable!("buffer taken before drop"),
        }
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.give_back(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reuse_after_drop() {
        let pool = ScratchPool::new(ScratchPoolConfig::default());
        {
            let mut buf = pool.get();
            buf.extend_from_slice(b"hello");
        }
        assert_eq!(pool.idle_count(), 1);

        let buf = pool.get();
        assert!(buf.is_empty());
        let stats = pool.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn test_oversized_buffer_discarded() {
        let pool = ScratchPool::new(ScratchPoolConfig {
            max_retained_size: 16,
            max_pooled: 8,
        });
        {
            let mut buf = pool.get();
            buf.extend_from_slice(&[0u8; 64]);
        }
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_pool_bounded_by_max_pooled() {
        let pool = ScratchPool::new(ScratchPoolConfig {
            max_retained_size: 1024,
            max_pooled: 2,
        });
        let a = pool.get();
        let b = pool.get();
        let c = pool.get();
        drop(a);
        drop(b);
        drop(c);
        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_returned_buffers_come_back_cleared() {
        let pool = ScratchPool::new(ScratchPoolConfig::default());
        {
            let mut buf = pool.get();
            buf.extend_from_slice(b"residue");
        }
        let buf = pool.get();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 7);
    }
}
