//! Delete-collection phase machine
//!
//! - Phases are explicit and enumerable
//! - Transitions are checked; anything not listed here is forbidden
//! - Cleanup is not a phase: it runs after whichever phase the command ended in
//!
//! ```text
//! CheckingAlias → CheckingExistence → Unloading → DecidingRetention
//!       │               │                              │
//!       │               └──→ ShortCircuited            ↓
//!       │                                          Enqueuing → Converging → Done
//!       └──→ Failed { phase } ←── (any non-terminal phase)
//! ```

use super::errors::{DeleteError, DeleteResult};

/// Phase of one delete invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    /// Reading a fresh alias snapshot
    CheckingAlias,

    /// Snapshot metadata removed; checking whether the collection is still in state
    CheckingExistence,

    /// Collection was already absent from state; nothing left but cleanup
    ShortCircuited,

    /// Unload-and-purge dispatched to every replica
    Unloading,

    /// Deciding whether the counter node survives
    DecidingRetention,

    /// Appending the delete message to the leader's queue
    Enqueuing,

    /// Waiting for the cached view to drop the collection
    Converging,

    /// Main sequence finished
    Done,

    /// Main sequence failed in `phase`
    Failed { phase: FailedPhase },
}

/// Non-terminal phase a failure was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedPhase {
    CheckingAlias,
    CheckingExistence,
    Unloading,
    DecidingRetention,
    Enqueuing,
    Converging,
}

impl FailedPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckingAlias => "CheckingAlias",
            Self::CheckingExistence => "CheckingExistence",
            Self::Unloading => "Unloading",
            Self::DecidingRetention => "DecidingRetention",
            Self::Enqueuing => "Enqueuing",
            Self::Converging => "Converging",
        }
    }
}

impl Default for DeletePhase {
    fn default() -> Self {
        Self::new()
    }
}

impl DeletePhase {
    /// Every invocation starts at the alias check.
    pub fn new() -> Self {
        Self::CheckingAlias
    }

    /// Get the phase name for observability.
    pub fn phase_name(&self) -> &'static str {
        match self {
            Self::CheckingAlias => "CheckingAlias",
            Self::CheckingExistence => "CheckingExistence",
            Self::ShortCircuited => "ShortCircuited",
            Self::Unloading => "Unloading",
            Self::DecidingRetention => "DecidingRetention",
            Self::Enqueuing => "Enqueuing",
            Self::Converging => "Converging",
            Self::Done => "Done",
            Self::Failed { .. } => "Failed",
        }
    }

    /// Check if the main sequence has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShortCircuited | Self::Done | Self::Failed { .. })
    }

    /// CheckingAlias → CheckingExistence
    pub fn alias_cleared(self) -> DeleteResult<Self> {
        match self {
            Self::CheckingAlias => Ok(Self::CheckingExistence),
            _ => Err(forbidden(self, "CheckingExistence")),
        }
    }

    /// CheckingExistence → ShortCircuited
    pub fn already_absent(self) -> DeleteResult<Self> {
        match self {
            Self::CheckingExistence => Ok(Self::ShortCircuited),
            _ => Err(forbidden(self, "ShortCircuited")),
        }
    }

    /// CheckingExistence → Unloading
    pub fn begin_unload(self) -> DeleteResult<Self> {
        match self {
            Self::CheckingExistence => Ok(Self::Unloading),
            _ => Err(forbidden(self, "Unloading")),
        }
    }

    /// Unloading → DecidingRetention
    pub fn unload_finished(self) -> DeleteResult<Self> {
        match self {
            Self::Unloading => Ok(Self::DecidingRetention),
            _ => Err(forbidden(self, "DecidingRetention")),
        }
    }

    /// DecidingRetention → Enqueuing
    pub fn begin_enqueue(self) -> DeleteResult<Self> {
        match self {
            Self::DecidingRetention => Ok(Self::Enqueuing),
            _ => Err(forbidden(self, "Enqueuing")),
        }
    }

    /// Enqueuing → Converging
    pub fn enqueued(self) -> DeleteResult<Self> {
        match self {
            Self::Enqueuing => Ok(Self::Converging),
            _ => Err(forbidden(self, "Converging")),
        }
    }

    /// Converging → Done
    pub fn converged(self) -> DeleteResult<Self> {
        match self {
            Self::Converging => Ok(Self::Done),
            _ => Err(forbidden(self, "Done")),
        }
    }

    /// Any non-terminal phase → Failed
    pub fn fail(self) -> DeleteResult<Self> {
        let phase = match self {
            Self::CheckingAlias => FailedPhase::CheckingAlias,
            Self::CheckingExistence => FailedPhase::CheckingExistence,
            Self::Unloading => FailedPhase::Unloading,
            Self::DecidingRetention => FailedPhase::DecidingRetention,
            Self::Enqueuing => FailedPhase::Enqueuing,
            Self::Converging => FailedPhase::Converging,
            Self::ShortCircuited | Self::Done | Self::Failed { .. } => {
                return Err(forbidden(self, "Failed"))
            }
        };
        Ok(Self::Failed { phase })
    }
}

fn forbidden(from: DeletePhase, to: &str) -> DeleteError {
    DeleteError::Internal(format!(
        "forbidden phase transition: {} → {}",
        from.phase_name(),
        to
    ))
}
