//! Scripted admin executor.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::cluster::admin::{CoreAdminRequest, ReplicaTarget, ShardAdmin};
use crate::cluster::errors::{AdminError, AdminErrorKind};

/// Admin executor that answers from a script keyed by core name.
///
/// Cores without a scripted failure acknowledge the unload.
#[derive(Debug, Default)]
pub struct ScriptedShardAdmin {
    failures: Mutex<HashMap<String, AdminErrorKind>>,
    calls: Mutex<Vec<(String, CoreAdminRequest)>>,
}

impl ScriptedShardAdmin {
    /// Create an executor that acknowledges every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make requests for `core` fail with `kind`.
    pub fn fail_core(&self, core: &str, kind: AdminErrorKind) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(core.to_string(), kind);
        }
    }

    /// Requests received so far as `(node, request)`.
    pub fn calls(&self) -> Vec<(String, CoreAdminRequest)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ShardAdmin for ScriptedShardAdmin {
    async fn execute(&self, target: &ReplicaTarget, request: &CoreAdminRequest) -> Result<String, AdminError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((target.node_name().to_string(), request.clone()));
        }

        let scripted = self
            .failures
            .lock()
            .ok()
            .and_then(|f| f.get(&request.core).copied());

        match scripted {
            None => Ok("unloaded".to_string()),
            Some(AdminErrorKind::NonExistentCore) => Err(AdminError::non_existent_core(&request.core)),
            Some(AdminErrorKind::Unreachable) => Err(AdminError::unreachable(target.node_name())),
            Some(kind) => Err(AdminError::new(
                kind,
                format!("unload of {} failed on {}", request.core, target.node_name()),
            )),
        }
    }
}
