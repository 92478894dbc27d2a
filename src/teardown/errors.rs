//! Teardown Error Types
//!
//! - Alias conflicts fail before any mutation
//! - Enqueue and convergence failures are reported after cleanup has run
//! - Cleanup faults are never surfaced here; they are logged

use thiserror::Error;

use crate::cluster::StoreError;

/// Result type for teardown operations
pub type DeleteResult<T> = Result<T, DeleteError>;

/// Error classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Caller must change something before retrying
    BadRequest,
    /// The cluster failed to carry out the request
    ServerError,
}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::BadRequest => 400,
            ErrorCode::ServerError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::ServerError => "SERVER_ERROR",
        }
    }
}

/// Teardown errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Collection : {collection} is part of alias {alias} remove or modify the alias before removing this collection.")]
    AliasConflict { collection: String, alias: String },

    #[error("Could not remove snapshot metadata of {collection}: {source}")]
    SnapshotCleanup {
        collection: String,
        source: StoreError,
    },

    #[error("Could not find collection : {0}")]
    CollectionNotFound(String),

    #[error("Coordination store error: {0}")]
    Store(#[from] StoreError),

    #[error("Could not enqueue delete of {collection}: {source}")]
    Enqueue {
        collection: String,
        source: StoreError,
    },

    #[error("Could not fully remove collection: {collection}")]
    ConvergenceTimeout { collection: String, waited_ms: u64 },

    #[error("Delete of {0} was cancelled")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeleteError {
    /// Classification of the error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            DeleteError::InvalidRequest(_) | DeleteError::InvalidConfig(_) => ErrorCode::BadRequest,
            _ => ErrorCode::ServerError,
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        self.error_code().code()
    }

    /// Check if the error was raised before anything was mutated.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            DeleteError::InvalidRequest(_) | DeleteError::AliasConflict { .. }
        )
    }
}
