//! Delete-collection controller
//!
//! Sequences one delete:
//!
//! 1. Alias check (conflict fails before anything is touched)
//! 2. Snapshot metadata removal
//! 3. Existence check (metadata-only collections skip straight to cleanup,
//!    unknown ones fail)
//! 4. Replica fanout
//! 5. Counter-node retention decision
//! 6. Delete message enqueued for the leader
//! 7. Wait for the cached view to converge
//!
//! Metadata cleanup runs after all of this on every exit path except an
//! alias conflict. Its own faults never replace the main sequence's result.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cluster::{
    cleanup_collection_level_snapshots, paths, AliasStore, ClusterStateView, CommandResults,
    CoordinationStore, ShardAdmin, StateUpdateQueue,
};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};

use super::alias_guard::ensure_not_aliased;
use super::cleanup::{CleanupGuarantor, CleanupGuard};
use super::config::DeleteConfig;
use super::errors::{DeleteError, DeleteResult};
use super::fanout::ReplicaFanout;
use super::phase::DeletePhase;
use super::poller::ConvergencePoller;
use super::publisher::publish_delete;
use super::request::{DeleteCollectionRequest, DeleteOutcome};
use super::retention::should_remove_counter_node;

/// Handles on every external collaborator the controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub view: Arc<dyn ClusterStateView>,
    pub store: Arc<dyn CoordinationStore>,
    pub aliases: Arc<dyn AliasStore>,
    pub admin: Arc<dyn ShardAdmin>,
    pub queue: Arc<dyn StateUpdateQueue>,
}

/// Delete-collection controller
///
/// Holds no per-invocation state; one controller serves any number of
/// sequential or concurrent invocations.
pub struct DeleteCollectionController {
    collaborators: Collaborators,
    fanout: ReplicaFanout,
    poller: ConvergencePoller,
    cleanup: CleanupGuarantor,
    metrics: Arc<MetricsRegistry>,
}

impl DeleteCollectionController {
    pub fn new(collaborators: Collaborators, config: &DeleteConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            fanout: ReplicaFanout::new(
                Arc::clone(&collaborators.admin),
                config.already_absent_errors.clone(),
            ),
            poller: ConvergencePoller::from_config(config),
            cleanup: CleanupGuarantor::new(Arc::clone(&collaborators.store), Arc::clone(&metrics)),
            collaborators,
            metrics,
        }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Delete `request.name`.
    ///
    /// Per-replica outcomes are recorded in `results` whatever the result.
    /// Cleanup has finished by the time this returns, unless the returned
    /// future is dropped first, in which case cleanup is spawned. An alias
    /// conflict returns without cleanup.
    pub async fn execute(
        &self,
        request: &DeleteCollectionRequest,
        results: &mut CommandResults,
        cancel: &CancellationToken,
    ) -> DeleteResult<DeleteOutcome> {
        if let Some(reason) = request.validate_format() {
            return Err(DeleteError::InvalidRequest(reason.to_string()));
        }

        let collection = request.name.as_str();
        self.metrics.increment_deletes_started();
        let scope = ObservationScope::with_fields("DELETE_COLLECTION", &[("collection", collection)]);

        let mut guard = CleanupGuard::arm(self.cleanup.clone(), collection, cancel.clone());
        let mut phase = DeletePhase::new();

        let primary = self
            .run_phases(request, results, cancel, &mut phase, &mut guard)
            .await;

        // An aliased collection must not lose any metadata.
        let cleanup = if primary.as_ref().err().is_some_and(DeleteError::is_pre_mutation) {
            guard.disarm();
            "skipped"
        } else {
            guard.run().await.as_str()
        };

        match &primary {
            Ok(outcome) => {
                match outcome {
                    DeleteOutcome::Deleted => self.metrics.increment_deletes_succeeded(),
                    DeleteOutcome::AlreadyAbsent => self.metrics.increment_deletes_short_circuited(),
                }
                scope.complete_with_fields(&[
                    ("outcome", outcome.as_str()),
                    ("cleanup", cleanup),
                ]);
            }
            Err(e) => {
                self.metrics.increment_deletes_failed();
                if let Ok(DeletePhase::Failed { phase: failed }) = phase.fail() {
                    log_event_with_fields(
                        Event::PhaseChanged,
                        &[("collection", collection), ("to", "Failed"), ("in", failed.as_str())],
                    );
                }
                scope.fail(&format!("{} (cleanup: {})", e, cleanup));
            }
        }
        primary
    }

    async fn run_phases(
        &self,
        request: &DeleteCollectionRequest,
        results: &mut CommandResults,
        cancel: &CancellationToken,
        phase: &mut DeletePhase,
        guard: &mut CleanupGuard,
    ) -> DeleteResult<DeleteOutcome> {
        let collection = request.name.as_str();
        let c = &self.collaborators;

        if let Err(e) = until_cancelled(cancel, collection, ensure_not_aliased(c.aliases.as_ref(), collection)).await {
            if matches!(e, DeleteError::AliasConflict { .. }) {
                self.metrics.increment_alias_conflicts();
            }
            return Err(e);
        }
        advance(phase, collection, DeletePhase::alias_cleared)?;

        until_cancelled(cancel, collection, async {
            cleanup_collection_level_snapshots(c.store.as_ref(), collection)
                .await
                .map_err(|source| DeleteError::SnapshotCleanup {
                    collection: collection.to_string(),
                    source,
                })
        })
        .await?;

        // One snapshot serves both the existence check and the fanout.
        let state = c.view.cluster_state();
        if !state.has_collection(collection) {
            let in_store = until_cancelled(cancel, collection, async {
                c.store
                    .exists(&paths::collection_path(collection))
                    .await
                    .map_err(DeleteError::from)
            })
            .await?;
            if !in_store {
                return Err(DeleteError::CollectionNotFound(collection.to_string()));
            }
            log_event_with_fields(Event::ShortCircuit, &[("collection", collection)]);
            advance(phase, collection, DeletePhase::already_absent)?;
            return Ok(DeleteOutcome::AlreadyAbsent);
        }

        advance(phase, collection, DeletePhase::begin_unload)?;
        let report = until_cancelled(cancel, collection, async {
            Ok::<_, DeleteError>(self
                .fanout
                .unload_all(&state, collection, request.async_id.as_deref(), results)
                .await)
        })
        .await?;
        self.metrics
            .record_fanout(report.unloaded, report.already_absent, report.failed_count());

        advance(phase, collection, DeletePhase::unload_finished)?;
        if !should_remove_counter_node(&report.failed) {
            guard.retain_counter_node();
            self.metrics.increment_counter_nodes_retained();
            log_event_with_fields(
                Event::CounterNodeRetained,
                &[("collection", collection), ("failed_replicas", &report.failed_count().to_string())],
            );
        }

        advance(phase, collection, DeletePhase::begin_enqueue)?;
        until_cancelled(cancel, collection, publish_delete(c.queue.as_ref(), collection)).await?;
        self.metrics.increment_messages_enqueued();

        advance(phase, collection, DeletePhase::enqueued)?;
        if let Err(e) = self
            .poller
            .wait_for_removal(c.view.as_ref(), collection, cancel)
            .await
        {
            if matches!(e, DeleteError::ConvergenceTimeout { .. }) {
                self.metrics.increment_convergence_timeouts();
            }
            return Err(e);
        }

        advance(phase, collection, DeletePhase::converged)?;
        Ok(DeleteOutcome::Deleted)
    }
}

/// Apply a checked transition and log it.
fn advance(
    phase: &mut DeletePhase,
    collection: &str,
    transition: fn(DeletePhase) -> DeleteResult<DeletePhase>,
) -> DeleteResult<()> {
    let next = transition(*phase)?;
    log_event_with_fields(
        Event::PhaseChanged,
        &[
            ("collection", collection),
            ("from", phase.phase_name()),
            ("to", next.phase_name()),
        ],
    );
    *phase = next;
    Ok(())
}

/// Run `work` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    collection: &str,
    work: impl Future<Output = DeleteResult<T>>,
) -> DeleteResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeleteError::Cancelled(collection.to_string())),
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::{ClusterFixture, SimulatedCluster};
    use crate::cluster::ClusterState;

    const FIXTURE: &str = r#"{
        "live_nodes": ["node1", "node2"],
        "collections": [{
            "name": "logs",
            "shards": {"shard1": {"replicas": [
                {"name": "r1", "core": "c1", "node_name": "node1"},
                {"name": "r2", "core": "c2", "node_name": "node2"}
            ]}}
        }]
    }"#;

    async fn cluster() -> SimulatedCluster {
        ClusterFixture::from_json(FIXTURE).unwrap().install().await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path() {
        let cluster = cluster().await;
        let leader_cancel = CancellationToken::new();
        let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());

        let controller = DeleteCollectionController::new(
            cluster.collaborators(),
            &DeleteConfig::default(),
            Arc::new(MetricsRegistry::new()),
        );
        let mut results = CommandResults::new();
        let outcome = controller
            .execute(&DeleteCollectionRequest::new("logs"), &mut results, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(results.success.len(), 2);
        assert!(cluster.store.paths_under("/collections/logs").is_empty());
        assert_eq!(controller.metrics().snapshot().deletes_succeeded, 1);

        leader_cancel.cancel();
        leader.await.unwrap();
    }

    /// Serves the installed snapshot once, then an empty one.
    struct VanishingView {
        first: Arc<ClusterState>,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl ClusterStateView for VanishingView {
        fn cluster_state(&self) -> Arc<ClusterState> {
            if self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                Arc::clone(&self.first)
            } else {
                Arc::new(ClusterState::default())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fanout_uses_snapshot_from_existence_check() {
        let cluster = cluster().await;
        let mut collaborators = cluster.collaborators();
        collaborators.view = Arc::new(VanishingView {
            first: cluster.view.cluster_state(),
            reads: std::sync::atomic::AtomicUsize::new(0),
        });

        let controller = DeleteCollectionController::new(
            collaborators,
            &DeleteConfig::default(),
            Arc::new(MetricsRegistry::new()),
        );
        let mut results = CommandResults::new();
        let outcome = controller
            .execute(&DeleteCollectionRequest::new("logs"), &mut results, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(cluster.admin.calls().len(), 2);
        assert_eq!(results.success.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let cluster = cluster().await;
        let controller = DeleteCollectionController::new(
            cluster.collaborators(),
            &DeleteConfig::default(),
            Arc::new(MetricsRegistry::new()),
        );
        let before = cluster.store.calls().len();

        let err = controller
            .execute(&DeleteCollectionRequest::new(""), &mut CommandResults::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(cluster.store.calls().len(), before);
        assert_eq!(controller.metrics().snapshot().deletes_started, 0);
    }

    #[test]
    fn test_advance_rejects_forbidden_transition() {
        let mut phase = DeletePhase::Done;
        let err = advance(&mut phase, "logs", DeletePhase::begin_unload).unwrap_err();
        assert!(matches!(err, DeleteError::Internal(_)));
        assert_eq!(phase, DeletePhase::Done);
    }
}
