//! Coordination-store path layout

/// Root of all collection subtrees
pub const COLLECTIONS_ZKNODE: &str = "/collections";

/// Live node registrations, one ephemeral child per node
pub const LIVE_NODES_ZKNODE: &str = "/live_nodes";

/// Collection alias document
pub const ALIASES: &str = "/aliases.json";

/// Root of per-collection snapshot metadata
pub const SNAPSHOTS_ZKNODE: &str = "/snapshots";

/// Leader state-update queue directory
pub const STATE_UPDATE_QUEUE: &str = "/overseer/queue";

/// Prefix of sequential entries in a queue directory
pub const QUEUE_ENTRY_PREFIX: &str = "qn-";

/// Name of the replica-name counter node under a collection
pub const COUNTER_NODE: &str = "counter";

/// Cluster state document written by the leader
pub const CLUSTER_STATE: &str = "/clusterstate.json";

/// Name of the per-collection state document
pub const STATE_JSON: &str = "state.json";

/// `/collections/<name>`
pub fn collection_path(collection: &str) -> String {
    format!("{}/{}", COLLECTIONS_ZKNODE, collection)
}

/// `/collections/<name>/counter`
pub fn counter_node_path(collection: &str) -> String {
    format!("{}/{}", collection_path(collection), COUNTER_NODE)
}

/// `/collections/<name>/state.json`
pub fn collection_state_path(collection: &str) -> String {
    format!("{}/{}", collection_path(collection), STATE_JSON)
}

/// `/snapshots/<name>`
pub fn snapshots_path(collection: &str) -> String {
    format!("{}/{}", SNAPSHOTS_ZKNODE, collection)
}

/// Join a parent path and a child name.
pub fn join(parent: &str, child: &str) -> String {
    if parent == "/" {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Parent of an absolute path, `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Number of segments below the root.
pub fn depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(collection_path("logs"), "/collections/logs");
        assert_eq!(counter_node_path("logs"), "/collections/logs/counter");
        assert_eq!(collection_state_path("logs"), "/collections/logs/state.json");
        assert_eq!(snapshots_path("logs"), "/snapshots/logs");
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("/", "collections"), "/collections");
        assert_eq!(join("/collections", "logs"), "/collections/logs");
        assert_eq!(parent("/collections/logs"), Some("/collections"));
        assert_eq!(parent("/collections"), Some("/"));
        assert_eq!(parent("/"), None);
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth("/"), 0);
        assert_eq!(depth("/collections"), 1);
        assert_eq!(depth("/collections/logs/counter"), 3);
    }
}
