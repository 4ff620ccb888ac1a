//! SQLite-backed collection store for local, single-user persistence.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use tokio::runtime::{Builder, Runtime};

use super::collection_store::{Collection, CollectionStore, StoreError};

/// SQLite collection store.
///
/// The domain runs synchronously, so this store owns a current-thread runtime
/// and drives each sqlx call to completion with `block_on`. Must not be used
/// from inside another tokio runtime.
#[derive(Debug)]
pub struct SqliteCollectionStore {
    runtime: Runtime,
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteCollectionStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StoreError::Runtime)?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        let pool = runtime.block_on(async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS collections (
                    name     TEXT PRIMARY KEY NOT NULL,
                    data     TEXT NOT NULL,
                    saved_at TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await?;

            Ok::<_, sqlx::Error>(pool)
        })?;

        tracing::debug!(path = %path.display(), "opened sqlite collection store");

        Ok(Self {
            runtime,
            pool,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CollectionStore for SqliteCollectionStore {
    fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError> {
        let row = self.runtime.block_on(
            sqlx::query(
                r#"
                SELECT data
                FROM collections
                WHERE name = ?1
                "#,
            )
            .bind(collection.key())
            .fetch_optional(&self.pool),
        )?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let data: String = row.try_get("data")?;
        let value = serde_json::from_str(&data)
            .map_err(|source| StoreError::Deserialize { collection, source })?;

        Ok(Some(value))
    }

    fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError> {
        let payload = encode(collection, records)?;
        let now = Utc::now().to_rfc3339();

        self.runtime.block_on(async {
            let mut conn = self.pool.acquire().await?;
            upsert(&mut conn, collection, &payload, &now).await
        })?;

        Ok(())
    }

    /// Saves every collection in one SQLite transaction.
    fn save_all(&self, collections: &[(Collection, JsonValue)]) -> Result<(), StoreError> {
        let payloads = collections
            .iter()
            .map(|(collection, records)| Ok((*collection, encode(*collection, records)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        let now = Utc::now().to_rfc3339();

        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await?;
            for (collection, payload) in &payloads {
                upsert(&mut tx, *collection, payload, &now).await?;
            }
            tx.commit().await
        })?;

        Ok(())
    }
}

fn encode(collection: Collection, records: &JsonValue) -> Result<String, StoreError> {
    serde_json::to_string(records).map_err(|source| StoreError::Serialize { collection, source })
}

async fn upsert(
    conn: &mut SqliteConnection,
    collection: Collection,
    payload: &str,
    saved_at: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO collections (name, data, saved_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(name)
        DO UPDATE SET
            data = excluded.data,
            saved_at = excluded.saved_at
        "#,
    )
    .bind(collection.key())
    .bind(payload)
    .bind(saved_at)
    .execute(conn)
    .await?;

    Ok(())
}

impl Drop for SqliteCollectionStore {
    fn drop(&mut self) {
        // Close inside the owning runtime so pooled connections shut down cleanly.
        self.runtime.block_on(self.pool.close());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_collection_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCollectionStore::open(dir.path().join("atk.db")).unwrap();
        assert!(store.load(Collection::Transactions).unwrap().is_none());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("atk.db");
        let store = SqliteCollectionStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn saved_collections_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atk.db");

        {
            let store = SqliteCollectionStore::open(&path).unwrap();
            store
                .save(Collection::Inventory, &json!([{"name": "Pulpen"}]))
                .unwrap();
            store
                .save(Collection::Inventory, &json!([{"name": "Pensil"}]))
                .unwrap();
            store.save(Collection::Transactions, &json!([])).unwrap();
        }

        let store = SqliteCollectionStore::open(&path).unwrap();
        assert_eq!(
            store.load(Collection::Inventory).unwrap(),
            Some(json!([{"name": "Pensil"}]))
        );
        assert_eq!(store.load(Collection::Transactions).unwrap(), Some(json!([])));
    }

    #[test]
    fn save_all_rolls_back_when_any_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCollectionStore::open(dir.path().join("atk.db")).unwrap();
        store
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    CREATE TRIGGER reject_inventory
                    BEFORE INSERT ON collections
                    WHEN NEW.name = 'atk_inventory'
                    BEGIN
                        SELECT RAISE(ABORT, 'inventory writes rejected');
                    END
                    "#,
                )
                .execute(&store.pool),
            )
            .unwrap();

        let err = store
            .save_all(&[
                (Collection::Transactions, json!([{"id": "t1"}])),
                (Collection::Inventory, json!([{"id": "i1"}])),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(store.load(Collection::Transactions).unwrap().is_none());
        assert!(store.load(Collection::Inventory).unwrap().is_none());
    }

    #[test]
    fn save_all_commits_every_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCollectionStore::open(dir.path().join("atk.db")).unwrap();
        store
            .save_all(&[
                (Collection::Transactions, json!([1])),
                (Collection::Inventory, json!([2])),
            ])
            .unwrap();

        assert_eq!(store.load(Collection::Transactions).unwrap(), Some(json!([1])));
        assert_eq!(store.load(Collection::Inventory).unwrap(), Some(json!([2])));
    }
}
