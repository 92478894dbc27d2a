//! Observable teardown events
//!
//! Events are explicit and typed. Every collection delete emits one event per
//! decision point, and exactly one cleanup outcome event.

use std::fmt;

/// Observable events in the collection teardown path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Command lifecycle
    /// Controller moved to a new phase
    PhaseChanged,

    // Alias guard
    /// Collection is referenced by an alias
    AliasConflict,

    // Existence
    /// Collection absent from cluster state but present in store
    ShortCircuit,

    // Fanout
    /// Unload fanout started
    FanoutBegin,
    /// Replica acknowledged unload
    ReplicaUnloaded,
    /// Replica was already gone
    ReplicaAlreadyAbsent,
    /// Replica did not acknowledge unload
    ReplicaUnloadFailed,
    /// Replica hosted on a node that is not live
    ReplicaNodeNotLive,
    /// Unload fanout complete
    FanoutComplete,

    // Retention
    /// Counter node will be kept
    CounterNodeRetained,

    // Queue
    /// State transition message appended to the leader queue
    StateMessageEnqueued,
    /// Queue append failed
    StateMessageEnqueueFailed,

    // Convergence
    /// Collection disappeared from the cached view
    Converged,
    /// Collection still present after the deadline
    ConvergenceTimeout,

    // Cleanup
    /// Metadata subtree removed
    CleanupComplete,
    /// Cleanup hit a store fault
    CleanupFaulted,
    /// Cleanup was interrupted by cancellation
    CleanupInterrupted,
    /// Cleanup ran from a dropped controller future
    CleanupDeferred,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PhaseChanged => "DELETE_PHASE_CHANGED",

            Event::AliasConflict => "ALIAS_CONFLICT",

            Event::ShortCircuit => "COLLECTION_ABSENT_FROM_STATE",

            Event::FanoutBegin => "REPLICA_FANOUT_BEGIN",
            Event::ReplicaUnloaded => "REPLICA_UNLOADED",
            Event::ReplicaAlreadyAbsent => "REPLICA_ALREADY_ABSENT",
            Event::ReplicaUnloadFailed => "REPLICA_UNLOAD_FAILED",
            Event::ReplicaNodeNotLive => "REPLICA_NODE_NOT_LIVE",
            Event::FanoutComplete => "REPLICA_FANOUT_COMPLETE",

            Event::CounterNodeRetained => "COUNTER_NODE_RETAINED",

            Event::StateMessageEnqueued => "STATE_MESSAGE_ENQUEUED",
            Event::StateMessageEnqueueFailed => "STATE_MESSAGE_ENQUEUE_FAILED",

            Event::Converged => "COLLECTION_CONVERGED",
            Event::ConvergenceTimeout => "CONVERGENCE_TIMEOUT",

            Event::CleanupComplete => "METADATA_CLEANUP_COMPLETE",
            Event::CleanupFaulted => "METADATA_CLEANUP_FAULTED",
            Event::CleanupInterrupted => "METADATA_CLEANUP_INTERRUPTED",
            Event::CleanupDeferred => "METADATA_CLEANUP_DEFERRED",
        }
    }

    /// Whether the event reports a failure of the command or one of its steps.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::AliasConflict
                | Event::ReplicaUnloadFailed
                | Event::StateMessageEnqueueFailed
                | Event::ConvergenceTimeout
                | Event::CleanupFaulted
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::PhaseChanged.as_str(), "DELETE_PHASE_CHANGED");
        assert_eq!(Event::CounterNodeRetained.as_str(), "COUNTER_NODE_RETAINED");
        assert_eq!(Event::CleanupInterrupted.to_string(), "METADATA_CLEANUP_INTERRUPTED");
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::ConvergenceTimeout.is_failure());
        assert!(Event::CleanupFaulted.is_failure());
        assert!(!Event::ReplicaAlreadyAbsent.is_failure());
        assert!(!Event::CleanupInterrupted.is_failure());
    }
}
