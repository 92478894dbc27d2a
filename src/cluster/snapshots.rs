//! Collection-level snapshot metadata.
//!
//! Snapshot index files are removed with the replicas' data directories; only
//! the metadata nodes under `/snapshots/<collection>` need explicit removal.

use super::errors::StoreResult;
use super::paths;
use super::store::CoordinationStore;

/// Remove the snapshot metadata subtree of `collection`, if present.
pub async fn cleanup_collection_level_snapshots(
    store: &dyn CoordinationStore,
    collection: &str,
) -> StoreResult<()> {
    let path = paths::snapshots_path(collection);
    if store.exists(&path).await? {
        store.clean(&path).await?;
    }
    Ok(())
}
