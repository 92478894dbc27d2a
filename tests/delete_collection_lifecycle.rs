//! Delete-collection lifecycle tests
//!
//! Cancellation, dropped invocations, async request ids and concurrent
//! invocations on one controller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use aerocluster::cluster::memory::{ClusterFixture, SimulatedCluster};
use aerocluster::cluster::CommandResults;
use aerocluster::observability::MetricsRegistry;
use aerocluster::teardown::{
    DeleteCollectionController, DeleteCollectionRequest, DeleteConfig, DeleteError, DeleteOutcome,
};

async fn install(watch_lag_ms: u64) -> SimulatedCluster {
    let fixture = json!({
        "live_nodes": ["node1", "node2"],
        "collections": [
            {
                "name": "logs",
                "shards": {"shard1": {"replicas": [
                    {"name": "r1", "core": "logs_r1", "node_name": "node1"},
                    {"name": "r2", "core": "logs_r2", "node_name": "node2"}
                ]}}
            },
            {
                "name": "metrics",
                "shards": {"shard1": {"replicas": [
                    {"name": "m1", "core": "metrics_m1", "node_name": "node1"}
                ]}}
            }
        ],
        "watch_lag_ms": watch_lag_ms
    });
    ClusterFixture::from_json(&fixture.to_string())
        .unwrap()
        .install()
        .await
        .unwrap()
}

fn controller(cluster: &SimulatedCluster) -> DeleteCollectionController {
    DeleteCollectionController::new(
        cluster.collaborators(),
        &DeleteConfig::default(),
        Arc::new(MetricsRegistry::new()),
    )
}

/// Test: Cancelling while waiting for convergence stops the wait, runs
/// cleanup once, and leaves the token cancelled.
#[tokio::test(start_paused = true)]
async fn test_cancel_during_convergence() {
    let cluster = install(60_000).await;
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let mut results = CommandResults::new();
    let outcome = controller
        .execute(&DeleteCollectionRequest::new("logs"), &mut results, &cancel)
        .await;

    assert_eq!(outcome, Err(DeleteError::Cancelled("logs".to_string())));
    assert!(cancel.is_cancelled());
    assert_eq!(results.success.len(), 2);
    assert_eq!(controller.metrics().snapshot().cleanups_run, 1);
    assert!(cluster.store.paths_under("/collections/logs").is_empty());

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: Same as above against a store whose calls do not complete on
/// first poll; the cancelled token must not cut cleanup short.
#[tokio::test(start_paused = true)]
async fn test_cancel_during_convergence_with_slow_store() {
    let cluster = install(60_000).await;
    cluster.store.yield_on_every_call();
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let mut results = CommandResults::new();
    let outcome = controller
        .execute(&DeleteCollectionRequest::new("logs"), &mut results, &cancel)
        .await;

    assert_eq!(outcome, Err(DeleteError::Cancelled("logs".to_string())));
    assert!(cancel.is_cancelled());
    let metrics = controller.metrics().snapshot();
    assert_eq!(metrics.cleanups_run, 1);
    assert_eq!(metrics.cleanups_interrupted, 0);
    assert!(cluster.store.paths_under("/collections/logs").is_empty());

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: A token cancelled before the delete starts still gets the
/// metadata cleaned up.
#[tokio::test(start_paused = true)]
async fn test_precancelled_delete_still_cleans_up() {
    let cluster = install(0).await;
    cluster.store.yield_on_every_call();
    let controller = controller(&cluster);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = controller
        .execute(&DeleteCollectionRequest::new("logs"), &mut CommandResults::new(), &cancel)
        .await;

    assert_eq!(outcome, Err(DeleteError::Cancelled("logs".to_string())));
    assert!(cluster.admin.calls().is_empty());
    assert!(cluster.store.paths_under("/collections/logs").is_empty());
}

/// Test: Dropping an in-flight delete still cleans up in the background.
#[tokio::test(start_paused = true)]
async fn test_dropped_delete_spawns_cleanup() {
    let cluster = install(60_000).await;
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let mut results = CommandResults::new();
    let cancel = CancellationToken::new();
    let timed_out = tokio::time::timeout(
        Duration::from_secs(2),
        controller.execute(&DeleteCollectionRequest::new("logs"), &mut results, &cancel),
    )
    .await;
    assert!(timed_out.is_err());

    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.metrics().snapshot().cleanups_run, 1);
    assert!(cluster.store.paths_under("/collections/logs").is_empty());

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: A delete dropped after Ctrl-C style cancellation still cleans up
/// through the spawned cleanup.
#[tokio::test(start_paused = true)]
async fn test_dropped_cancelled_delete_spawns_full_cleanup() {
    let cluster = install(60_000).await;
    cluster.store.yield_on_every_call();
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let mut results = CommandResults::new();
    let cancel = CancellationToken::new();
    let timed_out = tokio::time::timeout(
        Duration::from_secs(2),
        controller.execute(&DeleteCollectionRequest::new("logs"), &mut results, &cancel),
    )
    .await;
    assert!(timed_out.is_err());
    cancel.cancel();

    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.metrics().snapshot().cleanups_interrupted, 0);
    assert!(cluster.store.paths_under("/collections/logs").is_empty());

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: With an async id every dispatched unload carries a tracked
/// request id derived from it.
#[tokio::test(start_paused = true)]
async fn test_async_request_ids_are_tracked() {
    let cluster = install(0).await;
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let mut results = CommandResults::new();
    let outcome = controller
        .execute(
            &DeleteCollectionRequest::new("logs").with_async_id("job7"),
            &mut results,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(results.requests.len(), 2);
    assert!(results.requests.values().all(|id| id.starts_with("job7")));
    assert_ne!(results.requests["r1"], results.requests["r2"]);

    for (_, request) in cluster.admin.calls() {
        let id = request.async_request_id.unwrap();
        assert!(results.requests.values().any(|tracked| *tracked == id));
    }

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: Without an async id nothing is tracked.
#[tokio::test(start_paused = true)]
async fn test_sync_delete_tracks_no_requests() {
    let cluster = install(0).await;
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let mut results = CommandResults::new();
    controller
        .execute(&DeleteCollectionRequest::new("logs"), &mut results, &CancellationToken::new())
        .await
        .unwrap();

    assert!(results.requests.is_empty());
    assert!(cluster
        .admin
        .calls()
        .iter()
        .all(|(_, request)| request.async_request_id.is_none()));

    leader_cancel.cancel();
    leader.await.unwrap();
}

/// Test: One controller serves concurrent deletes of different collections.
#[tokio::test(start_paused = true)]
async fn test_concurrent_deletes_share_controller() {
    let cluster = install(200).await;
    let leader_cancel = CancellationToken::new();
    let leader = Arc::clone(&cluster.leader).spawn(leader_cancel.clone());
    let controller = controller(&cluster);

    let mut logs_results = CommandResults::new();
    let mut metrics_results = CommandResults::new();
    let cancel = CancellationToken::new();
    let logs_request = DeleteCollectionRequest::new("logs");
    let metrics_request = DeleteCollectionRequest::new("metrics");

    let (logs, metrics) = tokio::join!(
        controller.execute(&logs_request, &mut logs_results, &cancel),
        controller.execute(&metrics_request, &mut metrics_results, &cancel),
    );

    assert_eq!(logs.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(metrics.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(logs_results.success.len(), 2);
    assert_eq!(metrics_results.success.len(), 1);
    assert!(cluster.store.paths_under("/collections").iter().all(|p| p == "/collections"));
    assert_eq!(controller.metrics().snapshot().deletes_succeeded, 2);

    leader_cancel.cancel();
    leader.await.unwrap();
}
