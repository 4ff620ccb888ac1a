use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use atk_core::{DomainError, Entity, ItemId, TransactionId};

use crate::item::{InventoryItem, ItemCategory};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "Masuk", alias = "IN")]
    In,
    #[serde(rename = "Keluar", alias = "OUT")]
    Out,
}

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::In => "Masuk",
            TransactionType::Out => "Keluar",
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "masuk" => Ok(TransactionType::In),
            "out" | "keluar" => Ok(TransactionType::Out),
            other => Err(DomainError::invalid_value(format!(
                "unknown transaction type: {other:?}"
            ))),
        }
    }
}

/// An immutable, recorded stock movement.
///
/// `item_name` / `item_category` are a snapshot taken at recording time; the
/// referenced item may since have been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: TransactionId,
    item_id: ItemId,
    item_name: String,
    item_category: ItemCategory,
    #[serde(rename = "type")]
    kind: TransactionType,
    quantity: i64,
    date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn snapshot(
        id: TransactionId,
        item: &InventoryItem,
        kind: TransactionType,
        quantity: i64,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id: item.id_typed(),
            item_name: item.name().to_string(),
            item_category: item.category(),
            kind,
            quantity,
            date,
            timestamp,
        }
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn item_category(&self) -> ItemCategory {
        self.item_category
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Signed effect on stock: `+quantity` for IN, `-quantity` for OUT.
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            TransactionType::In => self.quantity,
            TransactionType::Out => -self.quantity,
        }
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: RecordTransaction.
///
/// `item_id` and `date` are optional because an incomplete form is a
/// validation failure, not a type error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTransaction {
    pub transaction_id: TransactionId,
    pub item_id: Option<ItemId>,
    pub kind: TransactionType,
    pub quantity: i64,
    pub date: Option<NaiveDate>,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of a successful `RecordTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransaction {
    pub transaction: Transaction,
    pub new_stock: i64,
}
