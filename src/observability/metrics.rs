//! Teardown metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all teardown counters
///
/// All counters use Relaxed atomics; exact totals are only guaranteed once the
/// commands being counted have returned.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    deletes_started: AtomicU64,
    deletes_succeeded: AtomicU64,
    deletes_failed: AtomicU64,
    deletes_short_circuited: AtomicU64,
    alias_conflicts: AtomicU64,
    replicas_unloaded: AtomicU64,
    replicas_already_absent: AtomicU64,
    replicas_failed: AtomicU64,
    counter_nodes_retained: AtomicU64,
    messages_enqueued: AtomicU64,
    convergence_timeouts: AtomicU64,
    cleanups_run: AtomicU64,
    cleanups_faulted: AtomicU64,
    cleanups_interrupted: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Command lifecycle

    pub fn increment_deletes_started(&self) {
        self.deletes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes_succeeded(&self) {
        self.deletes_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes_failed(&self) {
        self.deletes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes_short_circuited(&self) {
        self.deletes_short_circuited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_alias_conflicts(&self) {
        self.alias_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    // Fanout

    /// Record the outcome counts of one fanout.
    pub fn record_fanout(&self, unloaded: u64, already_absent: u64, failed: u64) {
        self.replicas_unloaded.fetch_add(unloaded, Ordering::Relaxed);
        self.replicas_already_absent
            .fetch_add(already_absent, Ordering::Relaxed);
        self.replicas_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn increment_counter_nodes_retained(&self) {
        self.counter_nodes_retained.fetch_add(1, Ordering::Relaxed);
    }

    // Queue and convergence

    pub fn increment_messages_enqueued(&self) {
        self.messages_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_convergence_timeouts(&self) {
        self.convergence_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    // Cleanup

    pub fn increment_cleanups_run(&self) {
        self.cleanups_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cleanups_faulted(&self) {
        self.cleanups_faulted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cleanups_interrupted(&self) {
        self.cleanups_interrupted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deletes_started: self.deletes_started.load(Ordering::Relaxed),
            deletes_succeeded: self.deletes_succeeded.load(Ordering::Relaxed),
            deletes_failed: self.deletes_failed.load(Ordering::Relaxed),
            deletes_short_circuited: self.deletes_short_circuited.load(Ordering::Relaxed),
            alias_conflicts: self.alias_conflicts.load(Ordering::Relaxed),
            replicas_unloaded: self.replicas_unloaded.load(Ordering::Relaxed),
            replicas_already_absent: self.replicas_already_absent.load(Ordering::Relaxed),
            replicas_failed: self.replicas_failed.load(Ordering::Relaxed),
            counter_nodes_retained: self.counter_nodes_retained.load(Ordering::Relaxed),
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            convergence_timeouts: self.convergence_timeouts.load(Ordering::Relaxed),
            cleanups_run: self.cleanups_run.load(Ordering::Relaxed),
            cleanups_faulted: self.cleanups_faulted.load(Ordering::Relaxed),
            cleanups_interrupted: self.cleanups_interrupted.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub deletes_started: u64,
    pub deletes_succeeded: u64,
    pub deletes_failed: u64,
    pub deletes_short_circuited: u64,
    pub alias_conflicts: u64,
    pub replicas_unloaded: u64,
    pub replicas_already_absent: u64,
    pub replicas_failed: u64,
    pub counter_nodes_retained: u64,
    pub messages_enqueued: u64,
    pub convergence_timeouts: u64,
    pub cleanups_run: u64,
    pub cleanups_faulted: u64,
    pub cleanups_interrupted: u64,
}
