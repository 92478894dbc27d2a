//! In-memory coordination store with fault injection and an operation log.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::cluster::errors::{StoreError, StoreResult};
use crate::cluster::paths;
use crate::cluster::store::{CoordinationStore, CreateMode};

/// Store operation kinds, as recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Exists,
    Create,
    GetData,
    SetData,
    GetChildren,
    Delete,
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub path: String,
}

/// What an injected fault does to a matching call.
#[derive(Debug, Clone)]
pub enum FaultAction {
    /// Return this error
    Fail(StoreError),
    /// Never complete
    Stall,
}

#[derive(Debug, Clone)]
struct Fault {
    op: StoreOp,
    path_prefix: String,
    action: FaultAction,
    remaining: Option<usize>,
}

#[derive(Debug, Clone, Default)]
struct StoredNode {
    data: Vec<u8>,
    next_sequence: u64,
}

/// Coordination store held entirely in memory.
///
/// Faults are matched by operation and path prefix, in injection order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    nodes: Mutex<BTreeMap<String, StoredNode>>,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<Vec<StoreCall>>,
    yielding: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store containing only the root.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), StoredNode::default());
        Self {
            nodes: Mutex::new(nodes),
            faults: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            yielding: AtomicBool::new(false),
        }
    }

    /// Make every call yield to the scheduler once before it runs, the way a
    /// networked store returns `Pending` at least once.
    pub fn yield_on_every_call(&self) {
        self.yielding.store(true, Ordering::Relaxed);
    }

    /// Make every matching call fail with `error`.
    pub fn fail_always(&self, op: StoreOp, path_prefix: &str, error: StoreError) {
        self.inject(op, path_prefix, FaultAction::Fail(error), None);
    }

    /// Make the next `times` matching calls fail with `error`.
    pub fn fail_times(&self, op: StoreOp, path_prefix: &str, error: StoreError, times: usize) {
        self.inject(op, path_prefix, FaultAction::Fail(error), Some(times));
    }

    /// Make every matching call hang.
    pub fn stall(&self, op: StoreOp, path_prefix: &str) {
        self.inject(op, path_prefix, FaultAction::Stall, None);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls of one kind whose path starts with `path_prefix`.
    pub fn calls_matching(&self, op: StoreOp, path_prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.op == op && c.path.starts_with(path_prefix))
            .map(|c| c.path)
            .collect()
    }

    /// Every node path currently stored under `prefix`.
    pub fn paths_under(&self, prefix: &str) -> Vec<String> {
        self.nodes
            .lock()
            .map(|nodes| {
                nodes
                    .keys()
                    .filter(|p| p.as_str() == prefix || p.starts_with(&format!("{}/", prefix)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn inject(&self, op: StoreOp, path_prefix: &str, action: FaultAction, remaining: Option<usize>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.push(Fault {
                op,
                path_prefix: path_prefix.to_string(),
                action,
                remaining,
            });
        }
    }

    fn nodes(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, StoredNode>>> {
        self.nodes
            .lock()
            .map_err(|_| StoreError::ConnectionLoss("store lock poisoned".to_string()))
    }

    /// Record the call and apply the first matching fault, if any.
    async fn enter(&self, op: StoreOp, path: &str) -> StoreResult<()> {
        if self.yielding.load(Ordering::Relaxed) {
            tokio::task::yield_now().await;
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(StoreCall {
                op,
                path: path.to_string(),
            });
        }

        let action = {
            let mut faults = match self.faults.lock() {
                Ok(f) => f,
                Err(_) => return Ok(()),
            };
            let idx = faults
                .iter()
                .position(|f| f.op == op && path.starts_with(&f.path_prefix));
            match idx {
                Some(i) => {
                    let action = faults[i].action.clone();
                    if let Some(remaining) = faults[i].remaining.as_mut() {
                        *remaining -= 1;
                        if *remaining == 0 {
                            faults.remove(i);
                        }
                    }
                    Some(action)
                }
                None => None,
            }
        };

        match action {
            None => Ok(()),
            Some(FaultAction::Fail(e)) => Err(e),
            Some(FaultAction::Stall) => std::future::pending().await,
        }
    }

    fn has_children(nodes: &BTreeMap<String, StoredNode>, path: &str) -> bool {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .any(|(k, _)| k != "/")
    }
}

#[async_trait]
impl CoordinationStore for InMemoryStore {
    async fn exists(&self, path: &str) -> StoreResult<bool> {
        self.enter(StoreOp::Exists, path).await?;
        Ok(self.nodes()?.contains_key(path))
    }

    async fn create(&self, path: &str, data: Vec<u8>, mode: CreateMode) -> StoreResult<String> {
        self.enter(StoreOp::Create, path).await?;
        let mut nodes = self.nodes()?;

        let parent = paths::parent(path).ok_or_else(|| StoreError::NodeExists("/".to_string()))?;
        let created = match mode {
            CreateMode::Persistent => path.to_string(),
            CreateMode::PersistentSequential => {
                let parent_node = nodes
                    .get_mut(parent)
                    .ok_or_else(|| StoreError::NoNode(parent.to_string()))?;
                let seq = parent_node.next_sequence;
                parent_node.next_sequence += 1;
                format!("{}{:010}", path, seq)
            }
        };

        if !nodes.contains_key(parent) {
            return Err(StoreError::NoNode(parent.to_string()));
        }
        if nodes.contains_key(&created) {
            return Err(StoreError::NodeExists(created));
        }
        nodes.insert(
            created.clone(),
            StoredNode {
                data,
                next_sequence: 0,
            },
        );
        Ok(created)
    }

    async fn get_data(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.enter(StoreOp::GetData, path).await?;
        self.nodes()?
            .get(path)
            .map(|n| n.data.clone())
            .ok_or_else(|| StoreError::NoNode(path.to_string()))
    }

    async fn set_data(&self, path: &str, data: Vec<u8>) -> StoreResult<()> {
        self.enter(StoreOp::SetData, path).await?;
        let mut nodes = self.nodes()?;
        let node = nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NoNode(path.to_string()))?;
        node.data = data;
        Ok(())
    }

    async fn get_children(&self, path: &str) -> StoreResult<Vec<String>> {
        self.enter(StoreOp::GetChildren, path).await?;
        let nodes = self.nodes()?;
        if !nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        let children = nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| {
                let rest = &k[prefix.len()..];
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect();
        Ok(children)
    }

    async fn delete(&self, path: &str) -> StoreResult<()> {
        self.enter(StoreOp::Delete, path).await?;
        let mut nodes = self.nodes()?;
        if !nodes.contains_key(path) {
            return Err(StoreError::NoNode(path.to_string()));
        }
        if Self::has_children(&nodes, path) {
            return Err(StoreError::NotEmpty(path.to_string()));
        }
        nodes.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_requires_parent() {
        let store = InMemoryStore::new();
        let err = store
            .create("/collections/logs", Vec::new(), CreateMode::Persistent)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NoNode("/collections".to_string()));
    }

    #[tokio::test]
    async fn test_sequential_nodes_are_ordered() {
        let store = InMemoryStore::new();
        store.make_path("/overseer/queue").await.unwrap();

        let first = store
            .create("/overseer/queue/qn-", b"a".to_vec(), CreateMode::PersistentSequential)
            .await
            .unwrap();
        let second = store
            .create("/overseer/queue/qn-", b"b".to_vec(), CreateMode::PersistentSequential)
            .await
            .unwrap();

        assert_eq!(first, "/overseer/queue/qn-0000000000");
        assert_eq!(second, "/overseer/queue/qn-0000000001");
        assert_eq!(
            store.get_children("/overseer/queue").await.unwrap(),
            vec!["qn-0000000000".to_string(), "qn-0000000001".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_rejects_non_empty() {
        let store = InMemoryStore::new();
        store.make_path("/collections/logs/counter").await.unwrap();

        let err = store.delete("/collections/logs").await.unwrap_err();
        assert_eq!(err, StoreError::NotEmpty("/collections/logs".to_string()));
    }

    #[tokio::test]
    async fn test_get_children_lists_direct_children_only() {
        let store = InMemoryStore::new();
        store.make_path("/collections/logs/leaders").await.unwrap();
        store.make_path("/collections/logs2").await.unwrap();

        assert_eq!(
            store.get_children("/collections").await.unwrap(),
            vec!["logs".to_string(), "logs2".to_string()]
        );
        assert_eq!(
            store.get_children("/").await.unwrap(),
            vec!["collections".to_string()]
        );
    }

    #[tokio::test]
    async fn test_injected_fault_is_consumed() {
        let store = InMemoryStore::new();
        store.fail_times(
            StoreOp::Exists,
            "/collections",
            StoreError::ConnectionLoss("reset".to_string()),
            1,
        );

        assert!(store.exists("/collections/logs").await.is_err());
        assert!(!store.exists("/collections/logs").await.unwrap());
        assert_eq!(store.calls_matching(StoreOp::Exists, "/collections").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_never_completes() {
        let store = InMemoryStore::new();
        store.stall(StoreOp::Delete, "/collections");

        let res = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            store.delete("/collections/logs"),
        )
        .await;
        assert!(res.is_err());
    }
}
