//! Cluster Collaborator Error Types
//!
//! - Coordination-store faults are typed so callers can tell a missing node
//!   from a lost connection or an interrupted call
//! - Admin-action failures expose a kind that is compared by value, never by
//!   message text

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for coordination-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Coordination-store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Node does not exist
    #[error("no node at {0}")]
    NoNode(String),

    /// Node already exists
    #[error("node already exists at {0}")]
    NodeExists(String),

    /// Node still has children
    #[error("node {0} is not empty")]
    NotEmpty(String),

    /// Connection to the store was lost mid-operation
    #[error("connection loss: {0}")]
    ConnectionLoss(String),

    /// Store session expired
    #[error("session expired")]
    SessionExpired,

    /// Call was interrupted before it completed
    #[error("operation interrupted on {0}")]
    Interrupted(String),

    /// Stored bytes could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Check if this error signals interruption rather than a store fault.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, StoreError::Interrupted(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Admin-action error kinds reported by the remote execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminErrorKind {
    /// The core named in the request does not exist on the node
    NonExistentCore,

    /// Node could not be reached
    Unreachable,

    /// Node did not answer in time
    Timeout,

    /// Node answered with a failure
    Remote,
}

impl AdminErrorKind {
    /// Returns the kind name string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminErrorKind::NonExistentCore => "NON_EXISTENT_CORE",
            AdminErrorKind::Unreachable => "UNREACHABLE",
            AdminErrorKind::Timeout => "TIMEOUT",
            AdminErrorKind::Remote => "REMOTE",
        }
    }
}

impl fmt::Display for AdminErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin-action error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminError {
    /// Error kind
    pub kind: AdminErrorKind,
    /// Error message
    pub message: String,
}

impl AdminError {
    /// Create a new admin error.
    pub fn new(kind: AdminErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Core is not present on the node.
    pub fn non_existent_core(core: &str) -> Self {
        Self::new(
            AdminErrorKind::NonExistentCore,
            format!("core {} does not exist", core),
        )
    }

    /// Node could not be reached.
    pub fn unreachable(node: &str) -> Self {
        Self::new(
            AdminErrorKind::Unreachable,
            format!("node {} is unreachable", node),
        )
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminError({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for AdminError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::Interrupted("/collections/logs".into()).is_interrupted());
        assert!(!StoreError::SessionExpired.is_interrupted());
        assert!(!StoreError::NotEmpty("/x".into()).is_interrupted());
    }

    #[test]
    fn test_admin_error_kind_serde() {
        let kind: AdminErrorKind = serde_json::from_str("\"non_existent_core\"").unwrap();
        assert_eq!(kind, AdminErrorKind::NonExistentCore);
        assert_eq!(
            serde_json::to_string(&AdminErrorKind::Timeout).unwrap(),
            "\"timeout\""
        );
    }

    #[test]
    fn test_admin_error_display() {
        let err = AdminError::non_existent_core("logs_shard1_replica_n1");
        let display = err.to_string();
        assert!(display.contains("NON_EXISTENT_CORE"));
        assert!(display.contains("logs_shard1_replica_n1"));
    }
}
