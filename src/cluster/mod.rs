//! Cluster subsystem
//!
//! Everything the teardown path reads from or writes to:
//!
//! - Cluster data model and the cached, watch-driven state view
//! - Coordination-store client seam and its path layout
//! - Alias mapping, leader state-update queue, snapshot metadata
//! - Remote admin-action seam and its results record
//!
//! # Consistency
//!
//! The leader is the only writer of cluster state. Readers see a cached
//! snapshot that may lag; nothing here assumes read-your-writes.

pub mod admin;
pub mod aliases;
mod errors;
pub mod memory;
pub mod model;
pub mod paths;
pub mod queue;
pub mod snapshots;
pub mod store;
pub mod view;

pub use admin::{CommandResults, CoreAdminAction, CoreAdminRequest, ReplicaTarget, ShardAdmin};
pub use aliases::{AliasStore, Aliases, StoreAliases};
pub use errors::{AdminError, AdminErrorKind, StoreError, StoreResult};
pub use model::{ClusterState, DocCollection, Replica, Shard};
pub use queue::{QueueOperation, StateTransitionMessage, StateUpdateQueue, StoreBackedQueue};
pub use snapshots::cleanup_collection_level_snapshots;
pub use store::{CoordinationStore, CreateMode};
pub use view::{ClusterStateView, WatchedClusterState};
