//! Coordination service interface.
//!
//! The tier router reads the migration consumer's committed offsets from a
//! coordination tree: one child node per partition under a fixed path,
//! each holding the next-to-consume offset as decimal text. The core needs
//! no write access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{BrokerError, Result};
use crate::BoxFuture;

/// Read-only coordination collaborator.
pub trait CoordinationBackend: Send + Sync {
    /// Lists the child node names under `path`.
    ///
    /// Returns `Ok(None)` when the path itself does not exist; callers
    /// treat that as zero updates, not an error.
    fn list_children(&self, path: &str) -> BoxFuture<'_, Result<Option<Vec<String>>>>;

    /// Reads the value stored at `path`.
    fn get(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>>>;
}

/// In-memory coordination tree for tests and local development.
pub struct MemoryCoordination {
    nodes: Mutex<HashMap<String, Vec<u8>>>,
    fail: AtomicBool,
}

impl MemoryCoordination {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Sets a node value, creating the node if needed.
    pub fn set(&self, path: &str, value: &[u8]) {
        self.nodes
            .lock()
            .unwrap()
            .insert(path.to_string(), value.to_vec());
    }

    /// Makes every subsequent call fail (simulates a session loss).
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check_fail(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BrokerError::Coordination("session lost".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryCoordination {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationBackend for MemoryCoordination {
    fn list_children(&self, path: &str) -> BoxFuture<'_, Result<Option<Vec<String>>>> {
        let prefix = format!("{path}/");
        Box::pin(async move {
            self.check_fail()?;
            let nodes = self.nodes.lock().unwrap();
            // The parent exists if any node lives under it.
            let mut children: Vec<String> = nodes
                .keys()
                .filter_map(|key| key.strip_prefix(&prefix))
                .filter(|rest| !rest.contains('/'))
                .map(|rest| rest.to_string())
                .collect();
            if children.is_empty() {
                return Ok(None);
            }
            children.sort();
            Ok(Some(children))
        })
    }

    fn get(&self, path: &str) -> BoxFuture<'_, Result<Vec<u8>>> {
        let path = path.to_string();
        Box::pin(async move {
            self.check_fail()?;
            self.nodes
                .lock()
                .unwrap()
                .get(&path)
                .cloned()
                .ok_or_else(|| BrokerError::Coordination(format!("node {path} not found")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_children_of_missing_path() {
        let coord = MemoryCoordination::new();
        let children = coord.list_children("/offsets").await.expect("list failed");
        assert!(children.is_none());
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let coord = MemoryCoordination::new();
        coord.set("/offsets/0", b"100");
        coord.set("/offsets/3", b"250");

        let children = coord
            .list_children("/offsets")
            .await
            .expect("list failed")
            .expect("path missing");
        assert_eq!(children, vec!["0", "3"]);

        let value = coord.get("/offsets/3").await.expect("get failed");
        assert_eq!(value, b"250");
    }

    #[tokio::test]
    async fn test_children_are_direct_only() {
        let coord = MemoryCoordination::new();
        coord.set("/a/b", b"1");
        coord.set("/a/b/c", b"2");

        let children = coord
            .list_children("/a")
            .await
            .expect("list failed")
            .expect("path missing");
        assert_eq!(children, vec!["b"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let coord = MemoryCoordination::new();
        coord.set("/x/y", b"1");
        coord.set_fail(true);
        assert!(coord.list_children("/x").await.is_err());
        assert!(coord.get("/x/y").await.is_err());
    }
}
