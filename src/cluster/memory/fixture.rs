//! Cluster fixtures
//!
//! A fixture describes a cluster as JSON: live nodes, collections with their
//! replicas, aliases, collections that exist only in the store, snapshot
//! metadata, scripted unload failures, and the leader's watch lag.
//! `install` turns it into a running set of in-memory collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cluster::aliases::{Aliases, StoreAliases};
use crate::cluster::errors::{AdminErrorKind, StoreResult};
use crate::cluster::model::{ClusterState, DocCollection};
use crate::cluster::paths;
use crate::cluster::queue::StoreBackedQueue;
use crate::cluster::store::{CoordinationStore, CreateMode};
use crate::cluster::view::WatchedClusterState;
use crate::teardown::Collaborators;

use super::admin::ScriptedShardAdmin;
use super::leader::SimulatedLeader;
use super::store::InMemoryStore;

/// Declarative description of a cluster.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterFixture {
    pub live_nodes: Vec<String>,
    pub collections: Vec<DocCollection>,
    /// Alias name → target collections
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Collections with a metadata subtree but no cluster-state entry
    pub store_only: Vec<String>,
    /// Collection → snapshot names with metadata under `/snapshots`
    pub snapshots: BTreeMap<String, Vec<String>>,
    /// Core name → error kind its unload fails with
    pub failing_cores: BTreeMap<String, AdminErrorKind>,
    pub watch_lag_ms: u64,
}

impl ClusterFixture {
    /// Parse a fixture document.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let mut fixture: Self = serde_json::from_str(json)?;
        for collection in &mut fixture.collections {
            for (key, shard) in collection.shards.iter_mut() {
                if shard.name.is_empty() {
                    shard.name = key.clone();
                }
            }
        }
        Ok(fixture)
    }

    /// Initial cluster state described by the fixture.
    pub fn cluster_state(&self) -> ClusterState {
        let state = self
            .collections
            .iter()
            .cloned()
            .fold(ClusterState::new(), ClusterState::with_collection);
        self.live_nodes
            .iter()
            .fold(state, |state, node| state.with_live_node(node.as_str()))
    }

    /// Seed an in-memory store and wire up every collaborator.
    pub async fn install(&self) -> StoreResult<SimulatedCluster> {
        let store = Arc::new(InMemoryStore::new());

        for node in &self.live_nodes {
            store
                .make_path(&paths::join(paths::LIVE_NODES_ZKNODE, node))
                .await?;
        }
        for collection in &self.collections {
            seed_collection_subtree(store.as_ref(), collection).await?;
        }
        for name in &self.store_only {
            seed_collection_subtree(store.as_ref(), &DocCollection::new(name.as_str())).await?;
        }
        for (collection, snapshot_names) in &self.snapshots {
            for snapshot in snapshot_names {
                store
                    .make_path(&paths::join(&paths::snapshots_path(collection), snapshot))
                    .await?;
            }
        }
        if !self.aliases.is_empty() {
            let aliases = self.aliases.iter().fold(Aliases::new(), |acc, (alias, targets)| {
                let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
                acc.with_alias(alias, &targets)
            });
            store
                .create(paths::ALIASES, aliases.to_json()?, CreateMode::Persistent)
                .await?;
        }

        let admin = Arc::new(ScriptedShardAdmin::new());
        for (core, kind) in &self.failing_cores {
            admin.fail_core(core, *kind);
        }

        let initial = self.cluster_state();
        let (publisher, view) = WatchedClusterState::channel(initial.clone());
        let shared: Arc<dyn CoordinationStore> = store.clone();
        let leader = Arc::new(SimulatedLeader::new(
            Arc::clone(&shared),
            initial.clone(),
            publisher,
            Duration::from_millis(self.watch_lag_ms),
        ));
        leader.persist(&initial).await?;

        Ok(SimulatedCluster {
            aliases: Arc::new(StoreAliases::new(Arc::clone(&shared))),
            queue: Arc::new(StoreBackedQueue::state_update_queue(shared)),
            store,
            admin,
            leader,
            view,
        })
    }
}

/// Create `/collections/<name>` with its counter node, state document and
/// per-shard leader nodes.
pub async fn seed_collection_subtree(
    store: &dyn CoordinationStore,
    collection: &DocCollection,
) -> StoreResult<()> {
    store.make_path(&paths::collection_path(&collection.name)).await?;
    store
        .create(
            &paths::counter_node_path(&collection.name),
            b"0".to_vec(),
            CreateMode::Persistent,
        )
        .await?;
    store
        .create(
            &paths::collection_state_path(&collection.name),
            collection.to_state_json()?,
            CreateMode::Persistent,
        )
        .await?;
    let leaders = paths::join(&paths::collection_path(&collection.name), "leaders");
    for shard in collection.shards.keys() {
        store.make_path(&paths::join(&leaders, shard)).await?;
    }
    Ok(())
}

/// A fixture installed into live in-memory collaborators.
pub struct SimulatedCluster {
    pub store: Arc<InMemoryStore>,
    pub admin: Arc<ScriptedShardAdmin>,
    pub leader: Arc<SimulatedLeader>,
    pub view: WatchedClusterState,
    pub aliases: Arc<StoreAliases>,
    pub queue: Arc<StoreBackedQueue>,
}

impl SimulatedCluster {
    /// Collaborator handles for a delete controller.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            view: Arc::new(self.view.clone()),
            store: self.store.clone(),
            aliases: self.aliases.clone(),
            admin: self.admin.clone(),
            queue: self.queue.clone(),
        }
    }
}
