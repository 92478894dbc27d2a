//! Collection aliases
//!
//! Aliases map an alias name to an ordered list of collections. The document
//! lives at `/aliases.json` as `{"collection": {"<alias>": "c1,c2"}}`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::paths;
use super::store::CoordinationStore;

/// Snapshot of the alias mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    collection_aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AliasesDocument {
    #[serde(default)]
    collection: BTreeMap<String, String>,
}

impl Aliases {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of one alias.
    pub fn with_alias(mut self, alias: &str, collections: &[&str]) -> Self {
        self.collection_aliases.insert(
            alias.to_string(),
            collections.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Alias name → target collections.
    pub fn collection_alias_list_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.collection_aliases
    }

    /// Aliases whose target list contains `collection`, in alias-name order.
    pub fn aliases_referencing<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.collection_aliases
            .iter()
            .filter(move |(_, targets)| targets.iter().any(|t| t == collection))
            .map(|(alias, _)| alias.as_str())
    }

    /// Parse the stored document. Empty input is an empty mapping.
    pub fn from_json(data: &[u8]) -> StoreResult<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }
        let doc: AliasesDocument = serde_json::from_slice(data)?;
        let collection_aliases = doc
            .collection
            .into_iter()
            .map(|(alias, joined)| {
                let targets = joined
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                (alias, targets)
            })
            .collect();
        Ok(Self { collection_aliases })
    }

    /// Serialize to the stored document format.
    pub fn to_json(&self) -> StoreResult<Vec<u8>> {
        let doc = AliasesDocument {
            collection: self
                .collection_aliases
                .iter()
                .map(|(alias, targets)| (alias.clone(), targets.join(",")))
                .collect(),
        };
        Ok(serde_json::to_vec(&doc)?)
    }
}

/// Source of alias snapshots.
#[async_trait]
pub trait AliasStore: Send + Sync {
    /// Read the current mapping from the authoritative store, bypassing caches.
    async fn fetch_aliases(&self) -> StoreResult<Aliases>;
}

/// Alias store reading `/aliases.json` from the coordination store.
pub struct StoreAliases {
    store: Arc<dyn CoordinationStore>,
}

impl StoreAliases {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AliasStore for StoreAliases {
    async fn fetch_aliases(&self) -> StoreResult<Aliases> {
        match self.store.get_data(paths::ALIASES).await {
            Ok(data) => Aliases::from_json(&data),
            Err(StoreError::NoNode(_)) => Ok(Aliases::new()),
            Err(e) => Err(e),
        }
    }
}
