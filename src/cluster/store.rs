//! Coordination-store client seam
//!
//! The store is hierarchical: every node has a parent, data, and ordered
//! children. Only the primitive operations are required from an
//! implementation; subtree helpers are provided on top of them.

use async_trait::async_trait;

use super::errors::{StoreError, StoreResult};
use super::paths;

/// How a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Plain persistent node
    Persistent,
    /// Persistent node whose name gets a monotonically increasing suffix
    PersistentSequential,
}

/// Coordination-store client.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Check whether a node exists.
    async fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Create a node; the parent must exist. Returns the created path, which
    /// differs from `path` for sequential nodes.
    async fn create(&self, path: &str, data: Vec<u8>, mode: CreateMode) -> StoreResult<String>;

    /// Read a node's data.
    async fn get_data(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Replace a node's data.
    async fn set_data(&self, path: &str, data: Vec<u8>) -> StoreResult<()>;

    /// Child names (not paths) of a node, sorted.
    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>>;

    /// Delete a childless node.
    async fn delete(&self, path: &str) -> StoreResult<()>;

    /// Create `path` and any missing ancestors as empty persistent nodes.
    async fn make_path(&self, path: &str) -> StoreResult<()> {
        let mut missing = Vec::new();
        let mut current = Some(path);
        while let Some(p) = current {
            if p == "/" || self.exists(p).await? {
                break;
            }
            missing.push(p.to_string());
            current = paths::parent(p);
        }
        for p in missing.iter().rev() {
            match self.create(p, Vec::new(), CreateMode::Persistent).await {
                Ok(_) | Err(StoreError::NodeExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Recursively delete `path` and everything below it.
    async fn clean(&self, path: &str) -> StoreResult<()> {
        self.clean_filtered(path, &|_: &str| true).await
    }

    /// Delete every node of the subtree at `path` (root included) for which
    /// `filter` returns true, deepest nodes first.
    ///
    /// Nodes that vanish concurrently are skipped. A node that still has
    /// children because one of them was filtered out is left in place.
    async fn clean_filtered(
        &self,
        path: &str,
        filter: &(dyn for<'p> Fn(&'p str) -> bool + Send + Sync),
    ) -> StoreResult<()> {
        let mut visited = Vec::new();
        let mut pending = vec![path.to_string()];

        while let Some(node) = pending.pop() {
            match self.get_children(&node).await {
                Ok(children) => {
                    for child in children {
                        pending.push(paths::join(&node, &child));
                    }
                    visited.push(node);
                }
                Err(StoreError::NoNode(_)) => {}
                Err(e) => return Err(e),
            }
        }

        visited.retain(|p| p != "/" && filter(p));
        visited.sort_by(|a, b| {
            paths::depth(b)
                .cmp(&paths::depth(a))
                .then_with(|| b.cmp(a))
        });

        for node in visited {
            match self.delete(&node).await {
                Ok(()) | Err(StoreError::NoNode(_)) | Err(StoreError::NotEmpty(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::InMemoryStore;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.make_path("/collections/logs/leaders/shard1").await.unwrap();
        store
            .create("/collections/logs/counter", b"7".to_vec(), CreateMode::Persistent)
            .await
            .unwrap();
        store
            .create("/collections/logs/state.json", b"{}".to_vec(), CreateMode::Persistent)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_make_path_creates_ancestors() {
        let store = InMemoryStore::new();
        store.make_path("/a/b/c").await.unwrap();
        assert!(store.exists("/a").await.unwrap());
        assert!(store.exists("/a/b").await.unwrap());
        assert!(store.exists("/a/b/c").await.unwrap());

        // Idempotent
        store.make_path("/a/b/c").await.unwrap();
    }

    #[tokio::test]
    async fn test_clean_removes_whole_subtree() {
        let store = seeded().await;
        store.clean("/collections/logs").await.unwrap();

        assert!(!store.exists("/collections/logs").await.unwrap());
        assert!(store.exists("/collections").await.unwrap());
    }

    #[tokio::test]
    async fn test_clean_filtered_keeps_counter_and_its_parent() {
        let store = seeded().await;
        let keep = "/collections/logs/counter".to_string();
        store
            .clean_filtered("/collections/logs", &move |p: &str| p != keep)
            .await
            .unwrap();

        assert!(store.exists("/collections/logs/counter").await.unwrap());
        assert!(store.exists("/collections/logs").await.unwrap());
        assert!(!store.exists("/collections/logs/state.json").await.unwrap());
        assert!(!store.exists("/collections/logs/leaders").await.unwrap());
        assert_eq!(store.get_data("/collections/logs/counter").await.unwrap(), b"7");
    }

    #[tokio::test]
    async fn test_clean_filtered_with_borrowing_predicate() {
        let store = seeded().await;
        let keep = vec![
            "/collections/logs".to_string(),
            "/collections/logs/leaders".to_string(),
        ];
        store
            .clean_filtered("/collections/logs", &|p: &str| !keep.iter().any(|k| k == p))
            .await
            .unwrap();

        assert!(store.exists("/collections/logs/leaders").await.unwrap());
        assert!(!store.exists("/collections/logs/leaders/shard1").await.unwrap());
        assert!(!store.exists("/collections/logs/counter").await.unwrap());
    }

    #[tokio::test]
    async fn test_clean_missing_path_is_noop() {
        let store = InMemoryStore::new();
        store.clean("/collections/absent").await.unwrap();
    }
}
