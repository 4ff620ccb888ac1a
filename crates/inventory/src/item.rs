use serde::{Deserialize, Serialize};

use atk_core::{DomainError, Entity, ItemId};

/// Closed set of office-supply categories.
///
/// Serialized by display label so persisted collections stay readable
/// (and compatible with data written by earlier versions of the tracker).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemCategory {
    #[serde(rename = "Kertas")]
    Paper,
    #[serde(rename = "Alat Tulis")]
    Pen,
    #[serde(rename = "Penyimpanan Arsip")]
    Binder,
    #[serde(rename = "Peralatan Kebersihan")]
    Cleaning,
    #[serde(rename = "Perlengkapan Printer")]
    Printer,
    #[serde(rename = "Lain-lain")]
    Other,
}

impl ItemCategory {
    /// All categories, in display order.
    pub const ALL: [ItemCategory; 6] = [
        ItemCategory::Paper,
        ItemCategory::Pen,
        ItemCategory::Binder,
        ItemCategory::Cleaning,
        ItemCategory::Printer,
        ItemCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ItemCategory::Paper => "Kertas",
            ItemCategory::Pen => "Alat Tulis",
            ItemCategory::Binder => "Penyimpanan Arsip",
            ItemCategory::Cleaning => "Peralatan Kebersihan",
            ItemCategory::Printer => "Perlengkapan Printer",
            ItemCategory::Other => "Lain-lain",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ItemCategory::Paper => "paper",
            ItemCategory::Pen => "pen",
            ItemCategory::Binder => "binder",
            ItemCategory::Cleaning => "cleaning",
            ItemCategory::Printer => "printer",
            ItemCategory::Other => "other",
        }
    }
}

impl core::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl core::str::FromStr for ItemCategory {
    type Err = DomainError;

    /// Accepts either the display label or the short code, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ItemCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(needle) || c.code().eq_ignore_ascii_case(needle))
            .ok_or_else(|| DomainError::invalid_value(format!("unknown item category: {needle:?}")))
    }
}

/// A stock item. `stock` only changes through recorded transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    category: ItemCategory,
    stock: i64,
}

impl InventoryItem {
    pub(crate) fn new(id: ItemId, name: String, category: ItemCategory, stock: i64) -> Self {
        Self {
            id,
            name,
            category,
            stock,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub(crate) fn set_stock(&mut self, stock: i64) {
        self.stock = stock;
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item_id: ItemId,
    pub name: String,
    pub category: ItemCategory,
    pub initial_stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_label_or_code() {
        assert_eq!("Kertas".parse::<ItemCategory>().unwrap(), ItemCategory::Paper);
        assert_eq!("alat tulis".parse::<ItemCategory>().unwrap(), ItemCategory::Pen);
        assert_eq!("PRINTER".parse::<ItemCategory>().unwrap(), ItemCategory::Printer);
        assert!("stapler".parse::<ItemCategory>().is_err());
    }

    #[test]
    fn item_serializes_in_camel_case_with_label_category() {
        let item = InventoryItem::new(ItemId::new(), "Pulpen".to_string(), ItemCategory::Pen, 10);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["category"], "Alat Tulis");
        assert_eq!(json["stock"], 10);
        assert_eq!(json["name"], "Pulpen");
    }
}
