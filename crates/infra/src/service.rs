//! Stock service: the inventory book plus its persistence lifecycle.
//!
//! ```text
//! open(store)         load both collections once, rehydrate the book
//! mutation            book decides (pure) → on success, save affected collections
//! report / export     re-derived from the full transaction collection
//! ```
//!
//! Saving is best-effort: a failed save is logged and counted but never turns a
//! committed mutation into an error. The in-memory book stays authoritative
//! for the rest of the process; a restart may lose that change.

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use atk_core::{DomainError, ItemId, TransactionId};
use atk_inventory::{
    AddItem, InventoryBook, InventoryItem, ItemCategory, REPORT_FILE_NAME, REPORT_SHEET_NAME,
    RecordTransaction, RecordedTransaction, Transaction, TransactionFilter, TransactionType,
    report_rows,
};

use crate::export::{ExportError, ExportOutcome, SpreadsheetExporter};
use crate::store::{Collection, CollectionStore, StoreError, load_records, to_collection_value};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Persisted state violates a domain invariant (duplicate ids, negative stock, ...).
    #[error("persisted state is inconsistent: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Repository-injected owner of the inventory book.
#[derive(Debug)]
pub struct StockService<S>
where
    S: CollectionStore,
{
    store: S,
    book: InventoryBook,
    persistence_failures: u64,
}

impl<S> StockService<S>
where
    S: CollectionStore,
{
    /// Load persisted state (initialization boundary).
    pub fn open(store: S) -> Result<Self, ServiceError> {
        let items: Vec<InventoryItem> = load_records(&store, Collection::Inventory)?;
        let transactions: Vec<Transaction> = load_records(&store, Collection::Transactions)?;
        let book = InventoryBook::from_parts(items, transactions)?;

        tracing::info!(
            items = book.item_count(),
            transactions = book.transactions().len(),
            "inventory loaded"
        );

        Ok(Self {
            store,
            book,
            persistence_failures: 0,
        })
    }

    pub fn book(&self) -> &InventoryBook {
        &self.book
    }

    /// Number of saves that failed since `open`.
    pub fn persistence_failures(&self) -> u64 {
        self.persistence_failures
    }

    /// Add an item with a freshly generated id.
    pub fn add_item(
        &mut self,
        name: &str,
        category: ItemCategory,
        initial_stock: i64,
    ) -> Result<InventoryItem, DomainError> {
        self.execute_add(AddItem {
            item_id: ItemId::new(),
            name: name.to_string(),
            category,
            initial_stock,
        })
    }

    pub fn execute_add(&mut self, cmd: AddItem) -> Result<InventoryItem, DomainError> {
        let item = self.book.add_item(cmd)?;
        tracing::info!(
            item_id = %item.id_typed(),
            name = item.name(),
            stock = item.stock(),
            "item added"
        );
        self.persist(&[Collection::Inventory]);
        Ok(item)
    }

    /// Remove an item; its transactions stay in the history.
    pub fn delete_item(&mut self, id: &ItemId) -> Option<InventoryItem> {
        let removed = self.book.delete_item(id);
        match &removed {
            Some(item) => {
                tracing::info!(item_id = %id, name = item.name(), "item deleted");
                self.persist(&[Collection::Inventory]);
            }
            None => tracing::debug!(item_id = %id, "delete of unknown item ignored"),
        }
        removed
    }

    /// Record a movement stamped with the current time.
    pub fn record_transaction(
        &mut self,
        item_id: Option<ItemId>,
        kind: TransactionType,
        quantity: i64,
        date: Option<NaiveDate>,
    ) -> Result<RecordedTransaction, DomainError> {
        self.execute_record(RecordTransaction {
            transaction_id: TransactionId::new(),
            item_id,
            kind,
            quantity,
            date,
            recorded_at: Utc::now(),
        })
    }

    pub fn execute_record(
        &mut self,
        cmd: RecordTransaction,
    ) -> Result<RecordedTransaction, DomainError> {
        let recorded = match self.book.record_transaction(cmd) {
            Ok(recorded) => recorded,
            Err(err) => {
                tracing::debug!(error = %err, "transaction rejected");
                return Err(err);
            }
        };

        tracing::info!(
            transaction_id = %recorded.transaction.id_typed(),
            item_id = %recorded.transaction.item_id(),
            kind = %recorded.transaction.kind(),
            quantity = recorded.transaction.quantity(),
            new_stock = recorded.new_stock,
            "transaction recorded"
        );

        self.persist(&[Collection::Transactions, Collection::Inventory]);
        Ok(recorded)
    }

    /// Filtered transactions, most recent first.
    pub fn report(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        self.book.filter_transactions(filter)
    }

    /// Export the filtered report; an empty result produces no file.
    pub fn export_report<E>(
        &self,
        filter: &TransactionFilter,
        exporter: &E,
    ) -> Result<ExportOutcome, ExportError>
    where
        E: SpreadsheetExporter,
    {
        let rows = report_rows(&self.report(filter));
        exporter.export(&rows, REPORT_FILE_NAME, REPORT_SHEET_NAME)
    }

    /// Save `collections` together; one failed save counts once.
    fn persist(&mut self, collections: &[Collection]) {
        let result = collections
            .iter()
            .map(|&collection| Ok((collection, self.collection_value(collection)?)))
            .collect::<Result<Vec<_>, StoreError>>()
            .and_then(|values| self.store.save_all(&values));

        if let Err(err) = result {
            self.persistence_failures += 1;
            tracing::error!(?collections, error = %err, "failed to persist collections");
        }
    }

    fn collection_value(&self, collection: Collection) -> Result<JsonValue, StoreError> {
        match collection {
            Collection::Inventory => {
                let items: Vec<&InventoryItem> = self.book.items().collect();
                to_collection_value(collection, &items)
            }
            Collection::Transactions => to_collection_value(collection, self.book.transactions()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::export::CsvExporter;
    use crate::store::{InMemoryCollectionStore, SqliteCollectionStore};

    fn jan(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, day)
    }

    /// Store whose saves can be switched to fail.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: InMemoryCollectionStore,
        fail_saves: AtomicBool,
    }

    impl CollectionStore for FlakyStore {
        fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError> {
            self.inner.load(collection)
        }

        fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.save(collection, records)
        }
    }

    #[test]
    fn mutations_are_mirrored_to_the_store() {
        let store = Arc::new(InMemoryCollectionStore::new());
        let mut service = StockService::open(store.clone()).unwrap();

        let item = service.add_item("Pulpen", ItemCategory::Pen, 10).unwrap();
        service
            .record_transaction(Some(item.id_typed()), TransactionType::In, 5, jan(3))
            .unwrap();

        let reopened = StockService::open(store).unwrap();
        assert_eq!(reopened.book(), service.book());
        assert_eq!(reopened.book().item(&item.id_typed()).unwrap().stock(), 15);
    }

    #[test]
    fn rejected_transaction_saves_nothing() {
        let store = Arc::new(InMemoryCollectionStore::new());
        let mut service = StockService::open(store.clone()).unwrap();
        let item = service.add_item("Pulpen", ItemCategory::Pen, 10).unwrap();

        let err = service
            .record_transaction(Some(item.id_typed()), TransactionType::Out, 20, jan(3))
            .unwrap_err();
        assert!(err.validation_errors().unwrap().contains("quantity"));
        assert!(store.load(Collection::Transactions).unwrap().is_none());
    }

    #[test]
    fn delete_persists_and_keeps_history() {
        let store = Arc::new(InMemoryCollectionStore::new());
        let mut service = StockService::open(store.clone()).unwrap();
        let item = service.add_item("Map", ItemCategory::Binder, 3).unwrap();
        service
            .record_transaction(Some(item.id_typed()), TransactionType::Out, 1, jan(4))
            .unwrap();

        assert!(service.delete_item(&item.id_typed()).is_some());
        assert!(service.delete_item(&item.id_typed()).is_none());

        let reopened = StockService::open(store).unwrap();
        assert_eq!(reopened.book().item_count(), 0);
        assert_eq!(reopened.report(&TransactionFilter::new()).len(), 1);
    }

    #[test]
    fn save_failures_do_not_fail_the_mutation() {
        let store = Arc::new(FlakyStore::default());
        let mut service = StockService::open(store.clone()).unwrap();
        store.fail_saves.store(true, Ordering::SeqCst);

        let item = service.add_item("Tinta", ItemCategory::Printer, 2).unwrap();
        assert_eq!(service.book().item_count(), 1);
        assert_eq!(service.persistence_failures(), 1);

        service
            .record_transaction(Some(item.id_typed()), TransactionType::In, 1, jan(5))
            .unwrap();
        assert_eq!(service.persistence_failures(), 2);
    }

    /// Store that remembers which collections each write covered.
    #[derive(Debug, Default)]
    struct BatchLog {
        inner: InMemoryCollectionStore,
        batches: Mutex<Vec<Vec<Collection>>>,
    }

    impl CollectionStore for BatchLog {
        fn load(&self, collection: Collection) -> Result<Option<JsonValue>, StoreError> {
            self.inner.load(collection)
        }

        fn save(&self, collection: Collection, records: &JsonValue) -> Result<(), StoreError> {
            self.batches.lock().unwrap().push(vec![collection]);
            self.inner.save(collection, records)
        }

        fn save_all(&self, collections: &[(Collection, JsonValue)]) -> Result<(), StoreError> {
            self.batches
                .lock()
                .unwrap()
                .push(collections.iter().map(|(c, _)| *c).collect());
            self.inner.save_all(collections)
        }
    }

    #[test]
    fn recording_saves_history_and_stock_in_one_write() {
        let store = Arc::new(BatchLog::default());
        let mut service = StockService::open(store.clone()).unwrap();
        let item = service.add_item("Amplop", ItemCategory::Paper, 5).unwrap();
        service
            .record_transaction(Some(item.id_typed()), TransactionType::Out, 2, jan(7))
            .unwrap();

        let batches = store.batches.lock().unwrap().clone();
        assert_eq!(
            batches,
            vec![
                vec![Collection::Inventory],
                vec![Collection::Transactions, Collection::Inventory],
            ]
        );
    }

    #[test]
    fn recorded_timestamp_survives_reload() {
        let store = Arc::new(InMemoryCollectionStore::new());
        let mut service = StockService::open(store.clone()).unwrap();
        let item = service.add_item("Spidol", ItemCategory::Pen, 3).unwrap();
        let recorded = service
            .record_transaction(Some(item.id_typed()), TransactionType::In, 1, jan(8))
            .unwrap();

        let reopened = StockService::open(store).unwrap();
        let reloaded = &reopened.book().transactions()[0];
        assert_eq!(reloaded.timestamp(), recorded.transaction.timestamp());
        assert_eq!(reloaded, &recorded.transaction);
    }

    #[test]
    fn corrupt_persisted_state_fails_open() {
        let store = InMemoryCollectionStore::new();
        store
            .save(Collection::Inventory, &serde_json::json!([{"bogus": true}]))
            .unwrap();
        let err = StockService::open(store).unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Deserialize { .. })));
    }

    #[test]
    fn export_report_writes_filtered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = StockService::open(InMemoryCollectionStore::new()).unwrap();
        let kertas = service.add_item("Kertas A4", ItemCategory::Paper, 10).unwrap();
        let pen = service.add_item("Pulpen", ItemCategory::Pen, 10).unwrap();
        service
            .record_transaction(Some(kertas.id_typed()), TransactionType::Out, 2, jan(5))
            .unwrap();
        service
            .record_transaction(Some(pen.id_typed()), TransactionType::In, 1, jan(6))
            .unwrap();

        let exporter = CsvExporter::new(dir.path());
        let filter = TransactionFilter::new().with_category(ItemCategory::Paper);
        let outcome = service.export_report(&filter, &exporter).unwrap();

        let ExportOutcome::Written { path, rows, .. } = outcome else {
            panic!("expected a written file");
        };
        assert_eq!(rows, 1);
        assert!(path.ends_with("Laporan_Transaksi_ATK.csv"));

        let csv = std::fs::read_to_string(path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ID_Transaksi,Tanggal,Jenis_Transaksi,Nama_Barang,Kategori_Barang,Jumlah")
        );
        let row = lines.next().unwrap();
        assert!(row.ends_with(",5/1/2024,Keluar,Kertas A4,Kertas,2"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn export_of_empty_report_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let service = StockService::open(InMemoryCollectionStore::new()).unwrap();
        let outcome = service
            .export_report(&TransactionFilter::new(), &CsvExporter::new(dir.path()))
            .unwrap();
        assert_eq!(outcome, ExportOutcome::Skipped);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn sqlite_backed_service_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atk.db");

        let item_id = {
            let mut service = StockService::open(SqliteCollectionStore::open(&path).unwrap()).unwrap();
            let item = service.add_item("Sabun", ItemCategory::Cleaning, 6).unwrap();
            service
                .record_transaction(Some(item.id_typed()), TransactionType::Out, 4, jan(9))
                .unwrap();
            assert_eq!(service.persistence_failures(), 0);
            item.id_typed()
        };

        let service = StockService::open(SqliteCollectionStore::open(&path).unwrap()).unwrap();
        assert_eq!(service.book().item(&item_id).unwrap().stock(), 2);
        assert_eq!(service.book().net_movement(&item_id), -4);
    }
}
