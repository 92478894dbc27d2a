//! Teardown subsystem
//!
//! Deletes a sharded, replicated collection:
//!
//! - Refuses collections that any alias still references
//! - Unloads every replica and records per-replica outcomes
//! - Keeps the counter node when a shared-storage replica could not be unloaded
//! - Hands the state change to the leader's queue and waits for the view to converge
//! - Removes leftover metadata on every exit, including failure and cancellation
//!
//! # Failure model
//!
//! Replica failures are partial and non-fatal. Enqueue failures and
//! convergence timeouts are fatal and are returned after cleanup has run.
//! An alias conflict is fatal before anything is touched, and skips cleanup
//! too. Cleanup faults are logged and never returned.

mod alias_guard;
mod cleanup;
mod config;
mod controller;
mod errors;
mod fanout;
mod phase;
mod poller;
mod publisher;
mod request;
mod retention;

pub use alias_guard::{check_aliases, ensure_not_aliased};
pub use cleanup::{CleanupGuarantor, CleanupGuard, CleanupOutcome};
pub use config::DeleteConfig;
pub use controller::{Collaborators, DeleteCollectionController};
pub use errors::{DeleteError, DeleteResult, ErrorCode};
pub use fanout::{FanoutReport, ReplicaFanout, NODE_NOT_LIVE};
pub use phase::{DeletePhase, FailedPhase};
pub use poller::ConvergencePoller;
pub use publisher::publish_delete;
pub use request::{DeleteCollectionRequest, DeleteOutcome};
pub use retention::should_remove_counter_node;
