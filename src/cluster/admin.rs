//! Remote admin-action seam
//!
//! The execution layer that actually talks to nodes lives outside this crate.
//! This module defines the request it is handed, the error it must return,
//! and the results record the teardown command reports back.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use super::errors::AdminError;
use super::model::Replica;

/// Core admin actions issued by the teardown path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoreAdminAction {
    /// Unload a core from its node
    Unload,
}

/// A single admin request addressed to one core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreAdminRequest {
    pub action: CoreAdminAction,
    pub core: String,
    pub delete_instance_dir: bool,
    pub delete_data_dir: bool,
    /// Set when the caller tracks the request asynchronously.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_request_id: Option<String>,
}

impl CoreAdminRequest {
    /// Unload `core` and delete both its instance and data directories.
    pub fn unload_and_purge(core: impl Into<String>) -> Self {
        Self {
            action: CoreAdminAction::Unload,
            core: core.into(),
            delete_instance_dir: true,
            delete_data_dir: true,
            async_request_id: None,
        }
    }

    /// Attach an async tracking id.
    pub fn with_async_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.async_request_id = Some(request_id.into());
        self
    }
}

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaTarget {
    pub collection: String,
    pub shard: String,
    pub replica: Replica,
}

impl ReplicaTarget {
    /// Node hosting the replica.
    pub fn node_name(&self) -> &str {
        &self.replica.node_name
    }
}

/// Remote admin-action executor.
///
/// Implementations own transport, per-node timeouts and, when a request
/// carries an async id, tracking the request until it completes.
#[async_trait]
pub trait ShardAdmin: Send + Sync {
    /// Execute `request` against the replica's node. Returns the node's
    /// status text on success.
    async fn execute(&self, target: &ReplicaTarget, request: &CoreAdminRequest) -> Result<String, AdminError>;
}

/// Per-replica results of one teardown command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResults {
    /// Replica name → status reported by its node
    pub success: BTreeMap<String, String>,

    /// Replica name → failure description
    pub failure: BTreeMap<String, String>,

    /// Replica name → async request id
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
}

impl CommandResults {
    /// Create an empty results record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, replica: &str, status: impl Into<String>) {
        self.success.insert(replica.to_string(), status.into());
    }

    pub fn add_failure(&mut self, replica: &str, reason: impl Into<String>) {
        self.failure.insert(replica.to_string(), reason.into());
    }

    pub fn track_request(&mut self, replica: &str, request_id: impl Into<String>) {
        self.requests.insert(replica.to_string(), request_id.into());
    }

    /// Check if any replica failed.
    pub fn has_failures(&self) -> bool {
        !self.failure.is_empty()
    }
}
