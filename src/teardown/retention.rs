//! Counter-node retention
//!
//! A replica on shared storage that failed to unload still has its data
//! directory in place. If the counter node were removed, a re-created
//! collection could hand out the same replica name and adopt that directory.

use crate::cluster::Replica;

/// Whether the counter node may be removed, given the replicas that failed
/// to unload.
pub fn should_remove_counter_node(failed: &[Replica]) -> bool {
    !failed.iter().any(Replica::is_shared_fs)
}
