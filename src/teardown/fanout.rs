//! Replica fanout
//!
//! Sends unload-and-purge to every replica of a collection and classifies the
//! outcomes. Partial failure is not an error here: the failed replicas are
//! returned so the caller can decide what metadata to keep.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;
use uuid::Uuid;

use crate::cluster::{
    AdminErrorKind, ClusterState, CommandResults, CoreAdminRequest, Replica, ReplicaTarget,
    ShardAdmin,
};
use crate::observability::{log_event_with_fields, warn_event, Event};

/// Failure reason recorded for replicas hosted on nodes that are not live.
pub const NODE_NOT_LIVE: &str = "node not live";

/// Outcome counts plus the replicas whose unload failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub failed: Vec<Replica>,
    pub unloaded: u64,
    pub already_absent: u64,
}

impl FanoutReport {
    pub fn failed_count(&self) -> u64 {
        u64::try_from(self.failed.len()).unwrap_or(u64::MAX)
    }
}

/// Dispatches unload requests through the admin executor.
pub struct ReplicaFanout {
    admin: Arc<dyn ShardAdmin>,
    already_absent: BTreeSet<AdminErrorKind>,
}

impl ReplicaFanout {
    /// Errors whose kind is in `already_absent` count as success.
    pub fn new(admin: Arc<dyn ShardAdmin>, already_absent: BTreeSet<AdminErrorKind>) -> Self {
        Self {
            admin,
            already_absent,
        }
    }

    /// Unload every replica of `collection` as recorded in `state`.
    ///
    /// With `async_id`, each request carries its own tracking id, recorded in
    /// `results.requests` under the replica name.
    pub async fn unload_all(
        &self,
        state: &ClusterState,
        collection: &str,
        async_id: Option<&str>,
        results: &mut CommandResults,
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        let doc = match state.collection(collection) {
            Some(doc) => doc,
            None => return report,
        };

        log_event_with_fields(Event::FanoutBegin, &[("collection", collection)]);

        let mut dispatches = Vec::new();
        for (shard, replica) in doc.replicas() {
            if !state.is_live(&replica.node_name) {
                warn_event(
                    Event::ReplicaNodeNotLive,
                    &[("replica", &replica.name), ("node", &replica.node_name)],
                );
                results.add_failure(&replica.name, NODE_NOT_LIVE);
                report.failed.push(replica.clone());
                continue;
            }

            let mut request = CoreAdminRequest::unload_and_purge(replica.core.as_str());
            if let Some(async_id) = async_id {
                let request_id = format!("{}{}", async_id, Uuid::new_v4().simple());
                results.track_request(&replica.name, request_id.as_str());
                request = request.with_async_request_id(request_id);
            }

            let target = ReplicaTarget {
                collection: collection.to_string(),
                shard: shard.to_string(),
                replica: replica.clone(),
            };
            let admin = Arc::clone(&self.admin);
            dispatches.push(async move {
                let outcome = admin.execute(&target, &request).await;
                (target.replica, outcome)
            });
        }

        for (replica, outcome) in join_all(dispatches).await {
            match outcome {
                Ok(status) => {
                    log_event_with_fields(Event::ReplicaUnloaded, &[("replica", &replica.name)]);
                    results.add_success(&replica.name, status);
                    report.unloaded += 1;
                }
                Err(e) if self.already_absent.contains(&e.kind) => {
                    log_event_with_fields(
                        Event::ReplicaAlreadyAbsent,
                        &[("replica", &replica.name), ("kind", e.kind.as_str())],
                    );
                    results.add_success(&replica.name, format!("already absent: {}", e.message));
                    report.already_absent += 1;
                }
                Err(e) => {
                    log_event_with_fields(
                        Event::ReplicaUnloadFailed,
                        &[
                            ("replica", &replica.name),
                            ("kind", e.kind.as_str()),
                            ("error", &e.message),
                        ],
                    );
                    results.add_failure(&replica.name, e.to_string());
                    report.failed.push(replica);
                }
            }
        }

        log_event_with_fields(
            Event::FanoutComplete,
            &[
                ("collection", collection),
                ("unloaded", &report.unloaded.to_string()),
                ("already_absent", &report.already_absent.to_string()),
                ("failed", &report.failed_count().to_string()),
            ],
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::memory::ScriptedShardAdmin;
    use crate::cluster::DocCollection;

    fn state() -> ClusterState {
        ClusterState::new()
            .with_live_node("node1")
            .with_live_node("node2")
            .with_collection(
                DocCollection::new("logs")
                    .with_replica("shard1", Replica::new("r1", "c1", "node1"))
                    .with_replica("shard1", Replica::new("r2", "c2", "node2"))
                    .with_replica("shard2", Replica::new("r3", "c3", "node3")),
            )
    }

    fn fanout(admin: Arc<ScriptedShardAdmin>) -> ReplicaFanout {
        ReplicaFanout::new(admin, BTreeSet::from([AdminErrorKind::NonExistentCore]))
    }

    #[tokio::test]
    async fn test_classifies_outcomes() {
        let admin = Arc::new(ScriptedShardAdmin::new());
        admin.fail_core("c2", AdminErrorKind::NonExistentCore);
        let mut results = CommandResults::new();

        let report = fanout(admin.clone())
            .unload_all(&state(), "logs", None, &mut results)
            .await;

        assert_eq!(report.unloaded, 1);
        assert_eq!(report.already_absent, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "r3");
        assert_eq!(results.failure["r3"], NODE_NOT_LIVE);
        assert!(results.success.contains_key("r1"));
        assert!(results.success.contains_key("r2"));
        assert!(results.requests.is_empty());
        // r3's node is not live, so only two requests went out
        assert_eq!(admin.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_non_allow_listed_error_is_failure() {
        let admin = Arc::new(ScriptedShardAdmin::new());
        admin.fail_core("c1", AdminErrorKind::Timeout);
        let mut results = CommandResults::new();

        let report = fanout(admin)
            .unload_all(&state(), "logs", None, &mut results)
            .await;

        let failed: Vec<_> = report.failed.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(failed, vec!["r1", "r3"]);
        assert!(results.failure["r1"].contains("TIMEOUT"));
    }

    #[tokio::test]
    async fn test_async_id_tracks_each_replica() {
        let admin = Arc::new(ScriptedShardAdmin::new());
        let mut results = CommandResults::new();

        fanout(admin.clone())
            .unload_all(&state(), "logs", Some("job7"), &mut results)
            .await;

        assert_eq!(results.requests.len(), 2);
        assert!(results.requests.values().all(|id| id.starts_with("job7")));
        assert_ne!(results.requests["r1"], results.requests["r2"]);
        for (_, request) in admin.calls() {
            let id = request.async_request_id.unwrap();
            assert!(results.requests.values().any(|tracked| *tracked == id));
            assert!(request.delete_data_dir && request.delete_instance_dir);
        }
    }

    #[tokio::test]
    async fn test_unknown_collection_dispatches_nothing() {
        let admin = Arc::new(ScriptedShardAdmin::new());
        let mut results = CommandResults::new();
        let report = fanout(admin.clone())
            .unload_all(&state(), "metrics", None, &mut results)
            .await;
        assert_eq!(report, FanoutReport::default());
        assert!(admin.calls().is_empty());
    }
}
