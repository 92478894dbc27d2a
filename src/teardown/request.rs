//! Delete-collection request and outcome types

use serde::{Deserialize, Serialize};

/// A request to delete one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCollectionRequest {
    /// Collection to delete
    pub name: String,

    /// Async tracking id; when set, every replica unload is tracked under a
    /// request id derived from it
    #[serde(default, rename = "async", skip_serializing_if = "Option::is_none")]
    pub async_id: Option<String>,
}

impl DeleteCollectionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            async_id: None,
        }
    }

    /// Track the request asynchronously under `async_id`.
    pub fn with_async_id(mut self, async_id: impl Into<String>) -> Self {
        self.async_id = Some(async_id.into());
        self
    }

    /// Validate the request format.
    ///
    /// Returns None if valid, or Some(reason) if invalid.
    pub fn validate_format(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("collection name is required");
        }
        if self.name.contains('/') {
            return Some("collection name must not contain '/'");
        }
        if matches!(self.async_id.as_deref(), Some(id) if id.is_empty()) {
            return Some("async id must not be empty");
        }
        None
    }
}

/// How a successful delete ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Replicas unloaded, leader applied the delete, view converged
    Deleted,
    /// Collection was not in cluster state; only residual metadata was removed
    AlreadyAbsent,
}

impl DeleteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "deleted",
            DeleteOutcome::AlreadyAbsent => "already_absent",
        }
    }
}
