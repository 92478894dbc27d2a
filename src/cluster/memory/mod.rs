//! In-memory collaborators
//!
//! Deterministic implementations of every external seam the teardown
//! controller talks to. The CLI drives them from a fixture file and the
//! tests drive them directly, injecting faults and watch lag.

mod admin;
mod fixture;
mod leader;
mod store;

pub use admin::ScriptedShardAdmin;
pub use fixture::{seed_collection_subtree, ClusterFixture, SimulatedCluster};
pub use leader::SimulatedLeader;
pub use store::{FaultAction, InMemoryStore, StoreCall, StoreOp};
