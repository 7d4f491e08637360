//! Document-store collaborator interface.
//!
//! The same document-oriented store backs two concerns: the dedup index
//! (fingerprint -> key records, exact-match on the three numeric fields)
//! and the cold tier (id -> bytes documents written by the external
//! migration consumer). The core consumes both through this trait; real
//! implementations carry their own connection pooling, consistency level,
//! and timeouts from configuration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{CoreError, Result};
use crate::fingerprint::Fingerprint;
use crate::types::ObjectId;
use crate::BoxFuture;

/// Document-oriented collaborator for dedup records and cold-tier objects.
pub trait DocumentStore: Send + Sync {
    /// Finds a previously issued key by exact fingerprint match.
    ///
    /// Returns `Ok(None)` when no record matches.
    fn find_key_by_fingerprint(&self, fp: &Fingerprint) -> BoxFuture<'_, Result<Option<String>>>;

    /// Inserts a fingerprint -> key dedup record.
    fn insert_dedup_record(&self, fp: &Fingerprint, key: &str) -> BoxFuture<'_, Result<()>>;

    /// Reads a migrated object's bytes from the cold tier.
    fn get_by_id(&self, id: ObjectId) -> BoxFuture<'_, Result<Vec<u8>>>;

    /// Writes or replaces a cold-tier object. Safe to repeat for one id.
    fn upsert_by_id(&self, id: ObjectId, data: Vec<u8>) -> BoxFuture<'_, Result<()>>;
}

/// Operation counters for the in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreStats {
    /// Dedup lookups served.
    pub lookups: u64,
    /// Dedup records inserted.
    pub inserts: u64,
    /// Cold-tier reads served.
    pub gets: u64,
    /// Cold-tier upserts applied.
    pub upserts: u64,
}

/// In-memory document store for tests and local development.
pub struct MemoryStore {
    dedup: Mutex<HashMap<(u32, u64, u64), String>>,
    objects: Mutex<HashMap<ObjectId, Vec<u8>>>,
    fail_dedup: AtomicBool,
    lookups: AtomicU64,
    inserts: AtomicU64,
    gets: AtomicU64,
    upserts: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self {
            dedup: Mutex::new(HashMap::new()),
            objects: Mutex::new(HashMap::new()),
            fail_dedup: AtomicBool::new(false),
            lookups: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            upserts: AtomicU64::new(0),
        }
    }

    /// Makes dedup lookups and inserts fail (simulates an unreachable store).
    pub fn set_fail_dedup(&self, fail: bool) {
        self.fail_dedup.store(fail, Ordering::SeqCst);
    }

    /// Number of dedup records currently held.
    pub fn dedup_record_count(&self) -> usize {
        self.dedup.lock().unwrap().len()
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> MemoryStoreStats {
        MemoryStoreStats {
            lookups: self.lookups.load(Ordering::SeqCst),
            inserts: self.inserts.load(Ordering::SeqCst),
            gets: self.gets.load(Ordering::SeqCst),
            upserts: self.upserts.load(Ordering::SeqCst),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn find_key_by_fingerprint(&self, fp: &Fingerprint) -> BoxFuture<'_, Result<Option<String>>> {
        let fields = (fp.hash32, fp.crypto_a, fp.crypto_b);
        Box::pin(async move {
            if self.fail_dedup.load(Ordering::SeqCst) {
                return Err(CoreError::Unavailable("dedup store down".to_string()));
            }
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.dedup.lock().unwrap().get(&fields).cloned())
        })
    }

    fn insert_dedup_record(&self, fp: &Fingerprint, key: &str) -> BoxFuture<'_, Result<()>> {
        let fields = (fp.hash32, fp.crypto_a, fp.crypto_b);
        let key = key.to_string();
        Box::pin(async move {
            if self.fail_dedup.load(Ordering::SeqCst) {
                return Err(CoreError::Unavailable("dedup store down".to_string()));
            }
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.dedup.lock().unwrap().insert(fields, key);
            Ok(())
        })
    }

    fn get_by_id(&self, id: ObjectId) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.objects
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(CoreError::NotFound { id })
        })
    }

    fn upsert_by_id(&self, id: ObjectId, data: Vec<u8>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            self.objects.lock().unwrap().insert(id, data);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;

    #[tokio::test]
    async fn test_dedup_record_round_trip() {
        let store = MemoryStore::new();
        let fp = fingerprint(b"abc");

        assert!(store
            .find_key_by_fingerprint(&fp)
            .await
            .expect("lookup failed")
            .is_none());

        store
            .insert_dedup_record(&fp, "bv_deadbeef")
            .await
            .expect("insert failed");

        let found = store
            .find_key_by_fingerprint(&fp)
            .await
            .expect("lookup failed");
        assert_eq!(found.as_deref(), Some("bv_deadbeef"));
    }

    #[tokio::test]
    async fn test_cold_tier_round_trip() {
        let store = MemoryStore::new();
        store
            .upsert_by_id(7, b"payload".to_vec())
            .await
            .expect("upsert failed");
        let data = store.get_by_id(7).await.expect("get failed");
        assert_eq!(data, b"payload");
    }

    #[tokio::test]
    async fn test_get_missing_id() {
        let store = MemoryStore::new();
        let err = store.get_by_id(404).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { id: 404 }));
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryStore::new();
        store.upsert_by_id(1, b"old".to_vec()).await.expect("upsert failed");
        store.upsert_by_id(1, b"new".to_vec()).await.expect("upsert failed");
        assert_eq!(store.get_by_id(1).await.expect("get failed"), b"new");
    }

    #[tokio::test]
    async fn test_fail_toggle() {
        let store = MemoryStore::new();
        store.set_fail_dedup(true);
        let fp = fingerprint(b"abc");
        assert!(store.find_key_by_fingerprint(&fp).await.is_err());
        assert!(store.insert_dedup_record(&fp, "k").await.is_err());
        // Cold-tier operations are unaffected by the dedup fault.
        store.upsert_by_id(1, b"x".to_vec()).await.expect("upsert failed");
    }
}
