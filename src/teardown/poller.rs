//! Convergence poller
//!
//! The leader applies the delete asynchronously and the local view learns
//! about it through watches, so the only way to know the delete landed is to
//! keep looking. Total wait is bounded by the deadline plus one poll interval
//! plus one settle delay.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cluster::ClusterStateView;
use crate::observability::{log_event_with_fields, Event};

use super::config::DeleteConfig;
use super::errors::{DeleteError, DeleteResult};

/// Polls the cached view until a collection disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergencePoller {
    timeout: Duration,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl ConvergencePoller {
    pub fn new(timeout: Duration, poll_interval: Duration, settle_delay: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            settle_delay,
        }
    }

    pub fn from_config(config: &DeleteConfig) -> Self {
        Self::new(
            config.convergence_timeout(),
            config.poll_interval(),
            config.settle_delay(),
        )
    }

    /// Wait until `collection` is absent from `view`, then settle.
    ///
    /// Returns the total time waited.
    pub async fn wait_for_removal(
        &self,
        view: &dyn ClusterStateView,
        collection: &str,
        cancel: &CancellationToken,
    ) -> DeleteResult<Duration> {
        let start = Instant::now();
        // No deadline when the timeout overflows the clock.
        let deadline = start.checked_add(self.timeout);

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            pause(self.poll_interval, collection, cancel).await?;
            if !view.has_collection(collection) {
                pause(self.settle_delay, collection, cancel).await?;
                let waited = start.elapsed();
                log_event_with_fields(
                    Event::Converged,
                    &[
                        ("collection", collection),
                        ("waited_ms", &waited.as_millis().to_string()),
                    ],
                );
                return Ok(waited);
            }
        }

        let waited_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_event_with_fields(
            Event::ConvergenceTimeout,
            &[("collection", collection), ("waited_ms", &waited_ms.to_string())],
        );
        Err(DeleteError::ConvergenceTimeout {
            collection: collection.to_string(),
            waited_ms,
        })
    }
}

async fn pause(duration: Duration, collection: &str, cancel: &CancellationToken) -> DeleteResult<()> {
    tokio::select! {
        _ = cancel.cancelled() => Err(DeleteError::Cancelled(collection.to_string())),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cluster::{ClusterState, DocCollection, WatchedClusterState};

    fn poller() -> ConvergencePoller {
        ConvergencePoller::from_config(&DeleteConfig::default())
    }

    fn with_logs() -> ClusterState {
        ClusterState::new().with_collection(DocCollection::new("logs"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_absent_settles_once() {
        let (_tx, view) = WatchedClusterState::channel(ClusterState::new());
        let waited = poller()
            .wait_for_removal(&view, "logs", &CancellationToken::new())
            .await
            .unwrap();
        assert!(waited >= Duration::from_millis(600));
        assert!(waited < Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observes_lagged_removal() {
        let (tx, view) = WatchedClusterState::channel(with_logs());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1_250)).await;
            tx.send(Arc::new(ClusterState::new())).unwrap();
        });

        let waited = poller()
            .wait_for_removal(&view, "logs", &CancellationToken::new())
            .await
            .unwrap();
        assert!(waited >= Duration::from_millis(1_250));
        assert!(waited <= Duration::from_millis(1_250 + 100 + 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_converging_view_times_out_within_bound() {
        let (_tx, view) = WatchedClusterState::channel(with_logs());
        let start = Instant::now();

        let err = poller()
            .wait_for_removal(&view, "logs", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeleteError::ConvergenceTimeout { ref collection, .. } if collection == "logs"));
        assert_eq!(err.to_string(), "Could not fully remove collection: logs");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed <= Duration::from_secs(30) + Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_still_converges() {
        let (tx, view) = WatchedClusterState::channel(with_logs());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(45)).await;
            tx.send(Arc::new(ClusterState::new())).unwrap();
        });

        let poller = ConvergencePoller::new(
            Duration::MAX,
            Duration::from_millis(100),
            Duration::from_millis(500),
        );
        let waited = poller
            .wait_for_removal(&view, "logs", &CancellationToken::new())
            .await
            .unwrap();
        assert!(waited >= Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_ends_wait() {
        let (_tx, view) = WatchedClusterState::channel(with_logs());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            trigger.cancel();
        });

        let err = poller().wait_for_removal(&view, "logs", &cancel).await.unwrap_err();
        assert_eq!(err, DeleteError::Cancelled("logs".into()));
    }
}
