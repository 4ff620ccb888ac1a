//! Transaction report: filtering, ordering and spreadsheet rows.
//!
//! The report is always re-derived from the full transaction collection;
//! nothing here is stored.

use chrono::NaiveDate;
use serde::Serialize;

use crate::item::ItemCategory;
use crate::transaction::{Transaction, TransactionType};

/// Default export file name (without extension).
pub const REPORT_FILE_NAME: &str = "Laporan_Transaksi_ATK";

/// Default export sheet name.
pub const REPORT_SHEET_NAME: &str = "Transaksi";

/// Report filter. Absent fields impose no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub category: Option<ItemCategory>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Category equality plus inclusive calendar-date bounds.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.category.is_some_and(|c| c != tx.item_category()) {
            return false;
        }
        if self.start_date.is_some_and(|start| tx.date() < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| tx.date() > end) {
            return false;
        }
        true
    }
}

/// Matching transactions, most recently recorded first.
///
/// Ordering uses `timestamp`, not `date`; equal timestamps keep the later
/// recording first.
pub fn filter_transactions(transactions: &[Transaction], filter: &TransactionFilter) -> Vec<Transaction> {
    let mut matched: Vec<(usize, &Transaction)> = transactions
        .iter()
        .enumerate()
        .filter(|(_, tx)| filter.matches(tx))
        .collect();

    matched.sort_by(|(ia, a), (ib, b)| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| ib.cmp(ia))
    });

    matched.into_iter().map(|(_, tx)| tx.clone()).collect()
}

/// One exported spreadsheet row. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "ID_Transaksi")]
    pub transaction_id: String,
    #[serde(rename = "Tanggal")]
    pub date: String,
    #[serde(rename = "Jenis_Transaksi")]
    pub kind: TransactionType,
    #[serde(rename = "Nama_Barang")]
    pub item_name: String,
    #[serde(rename = "Kategori_Barang")]
    pub item_category: ItemCategory,
    #[serde(rename = "Jumlah")]
    pub quantity: i64,
}

impl From<&Transaction> for ReportRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.id_typed().to_string(),
            date: display_date(tx.date()),
            kind: tx.kind(),
            item_name: tx.item_name().to_string(),
            item_category: tx.item_category(),
            quantity: tx.quantity(),
        }
    }
}

pub fn report_rows(transactions: &[Transaction]) -> Vec<ReportRow> {
    transactions.iter().map(ReportRow::from).collect()
}

/// Day/month/year without zero padding (`5/1/2024`).
pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}
