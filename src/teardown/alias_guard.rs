//! Alias guard
//!
//! A collection referenced by any alias must not be deleted. The check reads
//! a fresh alias snapshot and takes no lock, so an alias created between the
//! check and the delete is not caught.

use crate::cluster::{AliasStore, Aliases};
use crate::observability::{log_event_with_fields, Event};

use super::errors::{DeleteError, DeleteResult};

/// Fail with a conflict naming the first alias that references `collection`.
pub fn check_aliases(aliases: &Aliases, collection: &str) -> DeleteResult<()> {
    match aliases.aliases_referencing(collection).next() {
        Some(alias) => {
            log_event_with_fields(
                Event::AliasConflict,
                &[("collection", collection), ("alias", alias)],
            );
            Err(DeleteError::AliasConflict {
                collection: collection.to_string(),
                alias: alias.to_string(),
            })
        }
        None => Ok(()),
    }
}

/// Fetch a fresh alias snapshot and check it.
pub async fn ensure_not_aliased(store: &dyn AliasStore, collection: &str) -> DeleteResult<()> {
    let aliases = store.fetch_aliases().await?;
    check_aliases(&aliases, collection)
}
