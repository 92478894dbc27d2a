//! Simulated cluster leader.
//!
//! Consumes the state-update queue, applies each message to its
//! authoritative state, and publishes the result to watchers after a
//! configurable lag. The lag is what makes the cached view trail the leader.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cluster::errors::{StoreError, StoreResult};
use crate::cluster::model::ClusterState;
use crate::cluster::paths;
use crate::cluster::queue::{QueueOperation, StateTransitionMessage, StoreBackedQueue};
use crate::cluster::store::{CoordinationStore, CreateMode};
use crate::observability::Logger;

/// Single-threaded applier of queued state transitions.
pub struct SimulatedLeader {
    store: Arc<dyn CoordinationStore>,
    queue: StoreBackedQueue,
    state: Mutex<ClusterState>,
    publisher: watch::Sender<Arc<ClusterState>>,
    watch_lag: Duration,
    poll_interval: Duration,
}

impl SimulatedLeader {
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        initial: ClusterState,
        publisher: watch::Sender<Arc<ClusterState>>,
        watch_lag: Duration,
    ) -> Self {
        Self {
            queue: StoreBackedQueue::state_update_queue(Arc::clone(&store)),
            store,
            state: Mutex::new(initial),
            publisher,
            watch_lag,
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Override how often the queue is polled.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Authoritative state, which may be ahead of what watchers have seen.
    pub fn authoritative_state(&self) -> ClusterState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Drain the queue, then publish once after the watch lag.
    ///
    /// Returns the number of messages applied.
    pub async fn process_pending(&self) -> StoreResult<usize> {
        let mut applied = 0;
        while let Some(data) = self.queue.poll().await? {
            let message = match StateTransitionMessage::from_bytes(&data) {
                Ok(message) => message,
                Err(e) => {
                    Logger::warn("LEADER_MESSAGE_DISCARDED", &[("reason", &e.to_string())]);
                    continue;
                }
            };
            self.apply(&message).await?;
            applied += 1;
        }

        if applied > 0 {
            let state = self.authoritative_state();
            self.persist(&state).await?;
            tokio::time::sleep(self.watch_lag).await;
            let snapshot = Arc::new(state);
            // No receivers left is not an error for the leader.
            let _ = self.publisher.send(snapshot);
        }
        Ok(applied)
    }

    /// Write the authoritative state to `/clusterstate.json`.
    pub async fn persist(&self, state: &ClusterState) -> StoreResult<()> {
        let data = serde_json::to_vec(state)?;
        match self.store.set_data(paths::CLUSTER_STATE, data.clone()).await {
            Err(StoreError::NoNode(_)) => {
                self.store
                    .create(paths::CLUSTER_STATE, data, CreateMode::Persistent)
                    .await?;
                Ok(())
            }
            other => other,
        }
    }

    async fn apply(&self, message: &StateTransitionMessage) -> StoreResult<()> {
        match message.operation {
            QueueOperation::Delete => {
                if let Ok(mut state) = self.state.lock() {
                    state.collections.remove(&message.name);
                }
                match self
                    .store
                    .delete(&paths::collection_state_path(&message.name))
                    .await
                {
                    Ok(()) | Err(StoreError::NoNode(_)) => {}
                    Err(e) => return Err(e),
                }
                Logger::info("LEADER_COLLECTION_REMOVED", &[("collection", &message.name)]);
            }
        }
        Ok(())
    }

    /// Run the leader loop until `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {
                        if let Err(e) = self.process_pending().await {
                            Logger::warn("LEADER_QUEUE_ERROR", &[("error", &e.to_string())]);
                        }
                    }
                }
            }
        })
    }
}
