//! Inventory domain module.
//!
//! This crate contains the business rules for office-supply stock: items,
//! IN/OUT transactions and the transaction report, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod book;
pub mod item;
pub mod report;
pub mod transaction;

pub use book::InventoryBook;
pub use item::{AddItem, InventoryItem, ItemCategory};
pub use report::{
    REPORT_FILE_NAME, REPORT_SHEET_NAME, ReportRow, TransactionFilter, filter_transactions,
    report_rows,
};
pub use transaction::{RecordTransaction, RecordedTransaction, Transaction, TransactionType};
