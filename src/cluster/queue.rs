//! Leader state-update queue
//!
//! A single FIFO per cluster. Entries are persistent sequential nodes under
//! the queue directory; the sequence suffix is the delivery order, and the
//! leader consumes each entry exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::StoreResult;
use super::paths;
use super::store::{CoordinationStore, CreateMode};

/// Operations the leader applies from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueOperation {
    /// Remove a collection from cluster state
    Delete,
}

/// An immutable state-transition message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransitionMessage {
    pub operation: QueueOperation,
    pub name: String,
}

impl StateTransitionMessage {
    /// Message removing `collection` from cluster state.
    pub fn delete(collection: impl Into<String>) -> Self {
        Self {
            operation: QueueOperation::Delete,
            name: collection.into(),
        }
    }

    /// Wire encoding.
    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a queue entry.
    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Append-only handle on the leader's queue.
#[async_trait]
pub trait StateUpdateQueue: Send + Sync {
    /// Append an entry. Returns once the store has accepted it.
    async fn offer(&self, data: Vec<u8>) -> StoreResult<()>;
}

/// Queue stored as sequential nodes in the coordination store.
pub struct StoreBackedQueue {
    store: Arc<dyn CoordinationStore>,
    dir: String,
}

impl StoreBackedQueue {
    /// Queue rooted at `dir`.
    pub fn new(store: Arc<dyn CoordinationStore>, dir: impl Into<String>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }

    /// The leader's state-update queue.
    pub fn state_update_queue(store: Arc<dyn CoordinationStore>) -> Self {
        Self::new(store, paths::STATE_UPDATE_QUEUE)
    }

    /// Queue directory.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Entry paths in delivery order.
    pub async fn entries(&self) -> StoreResult<Vec<String>> {
        if !self.store.exists(&self.dir).await? {
            return Ok(Vec::new());
        }
        let mut children: Vec<String> = self
            .store
            .get_children(&self.dir)
            .await?
            .into_iter()
            .filter(|c| c.starts_with(paths::QUEUE_ENTRY_PREFIX))
            .collect();
        children.sort();
        Ok(children
            .into_iter()
            .map(|c| paths::join(&self.dir, &c))
            .collect())
    }

    /// Remove and return the head entry, if any.
    pub async fn poll(&self) -> StoreResult<Option<Vec<u8>>> {
        let head = match self.entries().await?.into_iter().next() {
            Some(head) => head,
            None => return Ok(None),
        };
        let data = self.store.get_data(&head).await?;
        self.store.delete(&head).await?;
        Ok(Some(data))
    }
}

#[async_trait]
impl StateUpdateQueue for StoreBackedQueue {
    async fn offer(&self, data: Vec<u8>) -> StoreResult<()> {
        self.store.make_path(&self.dir).await?;
        let entry = paths::join(&self.dir, paths::QUEUE_ENTRY_PREFIX);
        self.store
            .create(&entry, data, CreateMode::PersistentSequential)
            .await?;
        Ok(())
    }
}
