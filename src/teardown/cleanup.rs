//! Metadata cleanup
//!
//! Removes `/collections/<name>` once the delete command ends, however it
//! ends. When the counter node must survive, everything else in the subtree
//! is removed and the subtree root stays as the counter node's parent.
//!
//! Store faults are logged and counted, never returned: the command's own
//! outcome is what the caller sees. A cancellation that already ended the
//! command does not stop cleanup; only cancellation raised while cleanup
//! runs interrupts it, and that is logged and re-signalled on the
//! invocation's token.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::cluster::{paths, CoordinationStore, StoreError};
use crate::observability::{log_event_with_fields, warn_event, Event, Logger, MetricsRegistry};

/// How a cleanup run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Whole subtree removed
    Removed,
    /// Subtree removed except the counter node and its parent
    RemovedExceptCounter,
    /// No subtree to remove
    NothingToClean,
    /// Store fault; metadata may be left behind
    Faulted(StoreError),
    /// Cancelled or interrupted before finishing
    Interrupted,
}

impl CleanupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupOutcome::Removed => "removed",
            CleanupOutcome::RemovedExceptCounter => "removed_except_counter",
            CleanupOutcome::NothingToClean => "nothing_to_clean",
            CleanupOutcome::Faulted(_) => "faulted",
            CleanupOutcome::Interrupted => "interrupted",
        }
    }
}

/// Runs metadata cleanup for one collection.
#[derive(Clone)]
pub struct CleanupGuarantor {
    store: Arc<dyn CoordinationStore>,
    metrics: Arc<MetricsRegistry>,
}

impl CleanupGuarantor {
    pub fn new(store: Arc<dyn CoordinationStore>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { store, metrics }
    }

    /// Remove the collection's metadata subtree.
    ///
    /// `cancel` is the invocation's token. If it is already cancelled, that
    /// cancellation ended the main sequence and cleanup runs to completion
    /// regardless. Otherwise the store work races it, with store progress
    /// polled first so a call that is already done is not thrown away.
    pub async fn run(
        &self,
        collection: &str,
        remove_counter_node: bool,
        cancel: &CancellationToken,
    ) -> CleanupOutcome {
        self.metrics.increment_cleanups_run();

        let interrupt = if cancel.is_cancelled() {
            CancellationToken::new()
        } else {
            cancel.clone()
        };

        let outcome = tokio::select! {
            biased;
            result = self.remove_metadata(collection, remove_counter_node) => match result {
                Ok(outcome) => outcome,
                Err(e) if e.is_interrupted() => CleanupOutcome::Interrupted,
                Err(e) => CleanupOutcome::Faulted(e),
            },
            _ = interrupt.cancelled() => CleanupOutcome::Interrupted,
        };

        let fields = [("collection", collection), ("outcome", outcome.as_str())];
        match &outcome {
            CleanupOutcome::Faulted(e) => {
                self.metrics.increment_cleanups_faulted();
                let error = e.to_string();
                log_event_with_fields(
                    Event::CleanupFaulted,
                    &[("collection", collection), ("error", error.as_str())],
                );
            }
            CleanupOutcome::Interrupted => {
                self.metrics.increment_cleanups_interrupted();
                warn_event(Event::CleanupInterrupted, &fields);
                cancel.cancel();
            }
            _ => log_event_with_fields(Event::CleanupComplete, &fields),
        }
        outcome
    }

    async fn remove_metadata(
        &self,
        collection: &str,
        remove_counter_node: bool,
    ) -> Result<CleanupOutcome, StoreError> {
        let root = paths::collection_path(collection);
        if !self.store.exists(&root).await? {
            return Ok(CleanupOutcome::NothingToClean);
        }

        if remove_counter_node {
            self.store.clean(&root).await?;
            return Ok(CleanupOutcome::Removed);
        }

        let counter = paths::counter_node_path(collection);
        let keep_root = root.clone();
        self.store
            .clean_filtered(&root, &move |p: &str| p != counter.as_str() && p != keep_root.as_str())
            .await?;
        Ok(CleanupOutcome::RemovedExceptCounter)
    }
}

/// Guard that runs cleanup exactly once for one invocation.
///
/// The normal path awaits [`CleanupGuard::run`]. If the guard is dropped
/// without that having completed (the command future was dropped mid-flight),
/// cleanup is spawned onto the current runtime instead.
pub struct CleanupGuard {
    guarantor: CleanupGuarantor,
    collection: String,
    remove_counter_node: bool,
    cancel: CancellationToken,
    armed: bool,
}

impl CleanupGuard {
    /// Arm cleanup for `collection`. The counter node is removed unless
    /// [`CleanupGuard::retain_counter_node`] is called.
    pub fn arm(guarantor: CleanupGuarantor, collection: &str, cancel: CancellationToken) -> Self {
        Self {
            guarantor,
            collection: collection.to_string(),
            remove_counter_node: true,
            cancel,
            armed: true,
        }
    }

    /// Keep the counter node when cleaning up.
    pub fn retain_counter_node(&mut self) {
        self.remove_counter_node = false;
    }

    pub fn removes_counter_node(&self) -> bool {
        self.remove_counter_node
    }

    /// Disarm without cleaning up.
    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// Run cleanup now and disarm the guard.
    pub async fn run(mut self) -> CleanupOutcome {
        let outcome = self
            .guarantor
            .run(&self.collection, self.remove_counter_node, &self.cancel)
            .await;
        self.armed = false;
        outcome
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let collection = std::mem::take(&mut self.collection);
        match Handle::try_current() {
            Ok(handle) => {
                warn_event(Event::CleanupDeferred, &[("collection", collection.as_str())]);
                let guarantor = self.guarantor.clone();
                let remove_counter_node = self.remove_counter_node;
                let cancel = self.cancel.clone();
                handle.spawn(async move {
                    guarantor
                        .run(&collection, remove_counter_node, &cancel)
                        .await;
                });
            }
            Err(_) => {
                Logger::error(
                    Event::CleanupFaulted.as_str(),
                    &[
                        ("collection", collection.as_str()),
                        ("error", "no runtime to run cleanup on"),
                    ],
                );
            }
        }
    }
}
