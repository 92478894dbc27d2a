//! Cached cluster-state view
//!
//! Readers see whatever snapshot the watch channel last delivered. The view
//! may trail the leader's authoritative state by any number of watch cycles,
//! so read-your-writes is never assumed.

use std::sync::Arc;

use tokio::sync::watch;

use super::model::ClusterState;

/// Read access to the locally cached cluster state.
pub trait ClusterStateView: Send + Sync {
    /// The most recently delivered snapshot.
    fn cluster_state(&self) -> Arc<ClusterState>;

    /// Check the cached snapshot for a collection.
    fn has_collection(&self, name: &str) -> bool {
        self.cluster_state().has_collection(name)
    }
}

/// View fed by a `tokio::sync::watch` channel.
#[derive(Debug, Clone)]
pub struct WatchedClusterState {
    rx: watch::Receiver<Arc<ClusterState>>,
}

impl WatchedClusterState {
    /// Create a sender/view pair seeded with `initial`.
    pub fn channel(initial: ClusterState) -> (watch::Sender<Arc<ClusterState>>, Self) {
        let (tx, rx) = watch::channel(Arc::new(initial));
        (tx, Self { rx })
    }

    /// Wrap an existing receiver.
    pub fn from_receiver(rx: watch::Receiver<Arc<ClusterState>>) -> Self {
        Self { rx }
    }
}

impl ClusterStateView for WatchedClusterState {
    fn cluster_state(&self) -> Arc<ClusterState> {
        Arc::clone(&self.rx.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::model::DocCollection;

    #[test]
    fn test_view_follows_published_snapshots() {
        let initial = ClusterState::new().with_collection(DocCollection::new("logs"));
        let (tx, view) = WatchedClusterState::channel(initial.clone());
        assert!(view.has_collection("logs"));

        tx.send(Arc::new(initial.without_collection("logs"))).unwrap();
        assert!(!view.has_collection("logs"));
    }

    #[test]
    fn test_view_keeps_last_snapshot_after_sender_drop() {
        let initial = ClusterState::new().with_collection(DocCollection::new("logs"));
        let (tx, view) = WatchedClusterState::channel(initial);
        drop(tx);
        assert!(view.has_collection("logs"));
    }
}
