//! Dedup index over the document-store collaborator.
//!
//! Maps a content fingerprint to a previously issued key. Both operations
//! are best-effort from the write path's point of view: the orchestrator
//! logs failures and proceeds, trading a missed dedup opportunity for
//! availability. No locking happens here; at-most-one-record-per-content
//! is a soft invariant and a race between two first-writes of identical
//! content may produce two records. That is tolerated, not prevented.

use std::sync::Arc;

use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::store::DocumentStore;

/// Fingerprint -> key index backed by the document store.
pub struct DedupIndex {
    store: Arc<dyn DocumentStore>,
}

impl DedupIndex {
    /// Creates an index over the given store collaborator.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Looks up the key previously issued for this fingerprint, if any.
    pub async fn lookup(&self, fp: &Fingerprint) -> Result<Option<String>> {
        self.store.find_key_by_fingerprint(fp).await
    }

    /// Records a fingerprint -> key mapping.
    pub async fn insert(&self, fp: &Fingerprint, key: &str) -> Result<()> {
        self.store.insert_dedup_record(fp, key).await
    }
}
