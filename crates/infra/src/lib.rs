//! Infrastructure layer: persistence, spreadsheet export, config, orchestration.

pub mod config;
pub mod export;
pub mod service;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use export::{CsvExporter, ExportError, ExportOutcome, SpreadsheetExporter, XlsxExporter};
pub use service::{ServiceError, StockService};
pub use store::{
    Collection, CollectionStore, InMemoryCollectionStore, SqliteCollectionStore, StoreError,
};
