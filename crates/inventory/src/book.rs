//! The inventory book: items plus their transaction history.
//!
//! Invariant: for every item still present,
//! `stock == initial stock + Σ IN quantities − Σ OUT quantities` over the
//! transactions referencing it, and `stock >= 0`. Recording a transaction is
//! the only operation that changes `stock`.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, SubsecRound};

use atk_core::{DomainError, DomainResult, Entity, ItemId, TransactionId, ValidationErrors};

use crate::item::{AddItem, InventoryItem};
use crate::report::{self, TransactionFilter};
use crate::transaction::{RecordTransaction, RecordedTransaction, Transaction, TransactionType};

pub const FIELD_NAME: &str = "name";
pub const FIELD_INITIAL_STOCK: &str = "initial_stock";
pub const FIELD_ITEM: &str = "item_id";
pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_DATE: &str = "date";

/// Owns the item collection (id-keyed, insertion-ordered) and the append-only
/// transaction collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryBook {
    items: HashMap<ItemId, InventoryItem>,
    order: Vec<ItemId>,
    transactions: Vec<Transaction>,
    transaction_ids: HashSet<TransactionId>,
}

/// First id that occurs more than once, if any.
fn first_duplicate<E: Entity>(entities: &[E]) -> Option<E::Id> {
    let mut seen = HashSet::with_capacity(entities.len());
    entities
        .iter()
        .map(Entity::id)
        .find(|id| !seen.insert(*id))
        .cloned()
}

struct ValidatedMovement {
    item_id: ItemId,
    date: NaiveDate,
    new_stock: i64,
}

impl InventoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted collections.
    ///
    /// Transactions are not replayed: persisted `stock` already reflects them.
    pub fn from_parts(
        items: Vec<InventoryItem>,
        transactions: Vec<Transaction>,
    ) -> DomainResult<Self> {
        if let Some(id) = first_duplicate(&items) {
            return Err(DomainError::invariant(format!("duplicate item id {id}")));
        }
        if let Some(id) = first_duplicate(&transactions) {
            return Err(DomainError::invariant(format!("duplicate transaction id {id}")));
        }

        let mut book = Self::new();

        for item in items {
            let id = item.id_typed();
            if item.stock() < 0 {
                return Err(DomainError::invariant(format!(
                    "item {id} has negative stock ({})",
                    item.stock()
                )));
            }
            book.order.push(id);
            book.items.insert(id, item);
        }

        for tx in transactions {
            if tx.quantity() <= 0 {
                return Err(DomainError::invariant(format!(
                    "transaction {} has non-positive quantity ({})",
                    tx.id_typed(),
                    tx.quantity()
                )));
            }
            book.transaction_ids.insert(tx.id_typed());
            book.transactions.push(tx);
        }

        Ok(book)
    }

    /// Consume the book, returning `(items in insertion order, transactions in recording order)`.
    pub fn into_parts(mut self) -> (Vec<InventoryItem>, Vec<Transaction>) {
        let items = self
            .order
            .iter()
            .filter_map(|id| self.items.remove(id))
            .collect();
        (items, self.transactions)
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &InventoryItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn item(&self, id: &ItemId) -> Option<&InventoryItem> {
        self.items.get(id)
    }

    pub fn item_count(&self) -> usize {
        self.order.len()
    }

    /// Transactions in recording order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Sum of IN minus OUT quantities recorded against `id` (deleted items included).
    pub fn net_movement(&self, id: &ItemId) -> i64 {
        self.transactions
            .iter()
            .filter(|t| t.item_id() == *id)
            .map(Transaction::signed_quantity)
            .sum()
    }

    pub fn filter_transactions(&self, filter: &TransactionFilter) -> Vec<Transaction> {
        report::filter_transactions(&self.transactions, filter)
    }

    pub fn add_item(&mut self, cmd: AddItem) -> DomainResult<InventoryItem> {
        let name = cmd.name.trim();

        let mut errors = ValidationErrors::new();
        if name.is_empty() {
            errors.add(FIELD_NAME, "name cannot be empty");
        }
        if cmd.initial_stock < 0 {
            errors.add(FIELD_INITIAL_STOCK, "initial stock cannot be negative");
        } else if cmd.initial_stock == 0 {
            errors.add(FIELD_INITIAL_STOCK, "initial stock must be greater than 0");
        }
        errors.into_result()?;

        if self.items.contains_key(&cmd.item_id) {
            return Err(DomainError::invariant(format!(
                "duplicate item id {}",
                cmd.item_id
            )));
        }

        let item = InventoryItem::new(cmd.item_id, name.to_string(), cmd.category, cmd.initial_stock);
        self.items.insert(cmd.item_id, item.clone());
        self.order.push(cmd.item_id);
        Ok(item)
    }

    /// Remove an item. Transactions referencing it are kept untouched.
    pub fn delete_item(&mut self, id: &ItemId) -> Option<InventoryItem> {
        let removed = self.items.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// Append a transaction and apply its stock change, or change nothing.
    pub fn record_transaction(&mut self, cmd: RecordTransaction) -> DomainResult<RecordedTransaction> {
        let movement = self.validate_movement(&cmd)?;

        if self.transaction_ids.contains(&cmd.transaction_id) {
            return Err(DomainError::invariant(format!(
                "duplicate transaction id {}",
                cmd.transaction_id
            )));
        }

        let item = self
            .items
            .get_mut(&movement.item_id)
            .ok_or_else(|| DomainError::invariant("validated item disappeared"))?;

        let transaction = Transaction::snapshot(
            cmd.transaction_id,
            item,
            cmd.kind,
            cmd.quantity,
            movement.date,
            // Persisted timestamps carry millisecond precision.
            cmd.recorded_at.trunc_subsecs(3),
        );
        item.set_stock(movement.new_stock);
        self.transaction_ids.insert(cmd.transaction_id);
        self.transactions.push(transaction.clone());

        Ok(RecordedTransaction {
            transaction,
            new_stock: movement.new_stock,
        })
    }

    /// Collect every violation of `cmd` against current state.
    fn validate_movement(&self, cmd: &RecordTransaction) -> DomainResult<ValidatedMovement> {
        let mut errors = ValidationErrors::new();

        let item = match cmd.item_id {
            None => {
                errors.add(FIELD_ITEM, "item not selected");
                None
            }
            Some(id) => {
                let found = self.items.get(&id);
                if found.is_none() {
                    errors.add(FIELD_ITEM, "item not found");
                }
                found
            }
        };

        if cmd.quantity <= 0 {
            errors.add(FIELD_QUANTITY, "quantity must be greater than 0");
        } else if let (TransactionType::Out, Some(item)) = (cmd.kind, item) {
            if cmd.quantity > item.stock() {
                errors.add(
                    FIELD_QUANTITY,
                    format!("quantity exceeds available stock ({})", item.stock()),
                );
            }
        }

        if cmd.date.is_none() {
            errors.add(FIELD_DATE, "date missing");
        }

        match (item, cmd.date) {
            (Some(item), Some(date)) if errors.is_empty() => {
                let new_stock = match cmd.kind {
                    TransactionType::In => item.stock().checked_add(cmd.quantity),
                    TransactionType::Out => item.stock().checked_sub(cmd.quantity),
                }
                .ok_or_else(|| DomainError::invariant("stock arithmetic overflow"))?;

                Ok(ValidatedMovement {
                    item_id: item.id_typed(),
                    date,
                    new_stock,
                })
            }
            _ => Err(DomainError::Validation(errors)),
        }
    }
}
