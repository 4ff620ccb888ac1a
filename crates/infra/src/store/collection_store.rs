use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Logical collections persisted by the tracker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Inventory,
    Transactions,
}

impl Collection {
    /// Storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Inventory => "atk_inventory",
            Collection::Transactions => "atk_transactions",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: Collection,
        source: serde_json::Error,
    },

    #[error("failed to deserialize {collection}: {source}")]
    Deserialize {
        collection: Collection,
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to start storage runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Durable key/value store of whole collections.
///
/// `load` returns the most recently saved value, or `None` if the collection
/// was never saved. `save` overwrites the collection entirely.
///
/// `save_all` writes several collections together. Stores that can commit
/// them atomically override it; the default saves one after another.
pub trait CollectionStore: Send + Sync {
    fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError>;
    fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError>;

    fn save_all(&self, collections: &[(Collection, JsonValue)]) -> Result<(), StoreError> {
        for (collection, records) in collections {
            self.save(*collection, records)?;
        }
        Ok(())
    }
}

impl<S> CollectionStore for Arc<S>
where
    S: CollectionStore + ?Sized,
{
    fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError> {
        (**self).load(collection)
    }

    fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError> {
        (**self).save(collection, records)
    }

    fn save_all(&self, collections: &[(Collection, JsonValue)]) -> Result<(), StoreError> {
        (**self).save_all(collections)
    }
}

/// Load a collection as typed records; a never-saved collection is empty.
pub fn load_records<T, S>(store: &S, collection: Collection) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    S: CollectionStore + ?Sized,
{
    match store.load(collection)? {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|source| StoreError::Deserialize { collection, source }),
    }
}

/// Serialize typed records into the stored representation of `collection`.
pub fn to_collection_value<T>(collection: Collection, records: &[T]) -> Result<JsonValue, StoreError>
where
    T: Serialize,
{
    serde_json::to_value(records).map_err(|source| StoreError::Serialize { collection, source })
}

/// Overwrite a collection with typed records.
pub fn save_records<T, S>(store: &S, collection: Collection, records: &[T]) -> Result<(), StoreError>
where
    T: Serialize,
    S: CollectionStore + ?Sized,
{
    let value = to_collection_value(collection, records)?;
    store.save(collection, &value)
}
