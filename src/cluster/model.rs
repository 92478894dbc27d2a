//! Cluster data model
//!
//! The leader owns these values; everything in this crate reads them from a
//! cached snapshot and never mutates a snapshot in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::errors::StoreResult;

/// One node's copy of a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    /// Replica name, unique within the collection (e.g. `core_node3`)
    pub name: String,

    /// Core name on the hosting node
    pub core: String,

    /// Hosting node name
    pub node_name: String,

    /// Whether the data directory lives on storage a future replica may reuse
    #[serde(default)]
    pub shared_storage: bool,

    /// Data directory, set when the replica was created with an explicit one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl Replica {
    /// Create a replica on local storage.
    pub fn new(name: impl Into<String>, core: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            core: core.into(),
            node_name: node_name.into(),
            shared_storage: false,
            data_dir: None,
        }
    }

    /// Place the replica's data directory on shared storage.
    pub fn on_shared_storage(mut self, data_dir: impl Into<String>) -> Self {
        self.shared_storage = true;
        self.data_dir = Some(data_dir.into());
        self
    }

    /// A replica counts as shared-FS only when it is flagged shared and
    /// actually carries a data directory.
    pub fn is_shared_fs(&self) -> bool {
        self.shared_storage && self.data_dir.is_some()
    }
}

/// A shard and its replicas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub replicas: Vec<Replica>,
}

/// A collection as recorded in cluster state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocCollection {
    pub name: String,
    #[serde(default)]
    pub shards: BTreeMap<String, Shard>,
}

impl DocCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shards: BTreeMap::new(),
        }
    }

    /// Add a replica to a shard, creating the shard if needed.
    pub fn with_replica(mut self, shard: &str, replica: Replica) -> Self {
        self.shards
            .entry(shard.to_string())
            .or_insert_with(|| Shard {
                name: shard.to_string(),
                replicas: Vec::new(),
            })
            .replicas
            .push(replica);
        self
    }

    /// All replicas with their shard name, in shard order.
    pub fn replicas(&self) -> impl Iterator<Item = (&str, &Replica)> {
        self.shards
            .values()
            .flat_map(|shard| shard.replicas.iter().map(move |r| (shard.name.as_str(), r)))
    }

    /// Serialized `state.json` document for this collection.
    pub fn to_state_json(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a `state.json` document.
    pub fn from_state_json(data: &[u8]) -> StoreResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Snapshot of cluster state: collections plus the live-node set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterState {
    #[serde(default)]
    pub collections: BTreeMap<String, DocCollection>,
    #[serde(default)]
    pub live_nodes: BTreeSet<String>,
}

impl ClusterState {
    /// Create an empty cluster state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&DocCollection> {
        self.collections.get(name)
    }

    /// Check if the collection is present.
    pub fn has_collection(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Check if a node is live.
    pub fn is_live(&self, node_name: &str) -> bool {
        self.live_nodes.contains(node_name)
    }

    /// Builder-style insert of a collection.
    pub fn with_collection(mut self, collection: DocCollection) -> Self {
        self.collections.insert(collection.name.clone(), collection);
        self
    }

    /// Builder-style insert of a live node.
    pub fn with_live_node(mut self, node_name: impl Into<String>) -> Self {
        self.live_nodes.insert(node_name.into());
        self
    }

    /// Copy of this state without the named collection.
    pub fn without_collection(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.collections.remove(name);
        next
    }
}
