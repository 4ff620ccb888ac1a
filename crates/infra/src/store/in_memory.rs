use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::collection_store::{Collection, CollectionStore, StoreError};

/// In-memory collection store.
///
/// Intended for tests/dev. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryCollectionStore {
    collections: RwLock<HashMap<Collection, JsonValue>>,
}

impl InMemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for InMemoryCollectionStore {
    fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError> {
        let map = self.collections.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(&collection).cloned())
    }

    fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError> {
        let mut map = self.collections.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(collection, records.clone());
        Ok(())
    }

    fn save_all(&self, collections: &[(Collection, JsonValue)]) -> Result<(), StoreError> {
        let mut map = self.collections.write().map_err(|_| StoreError::LockPoisoned)?;
        for (collection, records) in collections {
            map.insert(*collection, records.clone());
        }
        Ok(())
    }
}
