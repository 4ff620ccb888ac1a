//! Collection persistence boundary.
//!
//! The inventory is persisted as two independent collections, each a JSON
//! array that is overwritten as a whole on every save.

pub mod collection_store;
pub mod in_memory;
pub mod sqlite;

pub use collection_store::{
    Collection, CollectionStore, StoreError, load_records, save_records, to_collection_value,
};
pub use in_memory::InMemoryCollectionStore;
pub use sqlite::SqliteCollectionStore;
