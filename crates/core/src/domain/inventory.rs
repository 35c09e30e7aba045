use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::product::ProductId;
use crate::errors::DomainError;

pub const UNKNOWN_CATEGORY: &str = "N/A";

/// Record as exchanged with the inventory service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub inventory_id: i64,
    pub product_id: i64,
    pub quantity_in_stock: u32,
    pub reorder_level: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryRecord {
    pub product_id: i64,
    pub quantity_in_stock: u32,
    pub reorder_level: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_in_stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<u32>,
}

impl InventoryPatch {
    pub fn is_empty(&self) -> bool {
        self.quantity_in_stock.is_none() && self.reorder_level.is_none()
    }
}

/// Local projection of an [`InventoryRecord`] with display fields filled in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub quantity_in_stock: u32,
    pub reorder_level: u32,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// The inventory service does not know product names; the catalog does when the product
    /// is listed, otherwise placeholders are used.
    pub fn from_record(record: &InventoryRecord, catalog: &Catalog, now: DateTime<Utc>) -> Self {
        let product_id = ProductId(record.product_id.to_string());
        let (product_name, category) = match catalog.find(&product_id) {
            Some(product) => (product.name.clone(), product.category.clone()),
            None => (format!("Product {product_id}"), UNKNOWN_CATEGORY.to_owned()),
        };

        Self {
            id: record.inventory_id.to_string(),
            product_id,
            product_name,
            category,
            quantity_in_stock: record.quantity_in_stock,
            reorder_level: record.reorder_level,
            last_updated: now,
            created_at: now,
        }
    }

    /// Takes the stock figures from a service echo, keeping local display fields.
    pub fn reconcile(&mut self, record: &InventoryRecord, now: DateTime<Utc>) {
        self.quantity_in_stock = record.quantity_in_stock;
        self.reorder_level = record.reorder_level;
        self.last_updated = now;
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_stock <= self.reorder_level
    }

    pub fn increased_stock(&self, amount: u32) -> u32 {
        self.quantity_in_stock.saturating_add(amount)
    }

    /// Never goes below zero.
    pub fn reduced_stock(&self, amount: u32) -> u32 {
        self.quantity_in_stock.saturating_sub(amount)
    }
}

/// Inventory ids are numeric on the service side.
pub fn parse_inventory_id(id: &str) -> Result<i64, DomainError> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| DomainError::validation(format!("inventory id `{id}` is not numeric")))
}

pub fn parse_product_id(id: &ProductId) -> Result<i64, DomainError> {
    id.0.trim()
        .parse::<i64>()
        .map_err(|_| DomainError::validation(format!("product id `{id}` is not numeric")))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{parse_inventory_id, InventoryItem, InventoryPatch, InventoryRecord};
    use crate::catalog::Catalog;

    fn record(product_id: i64, stock: u32, reorder: u32) -> InventoryRecord {
        InventoryRecord { inventory_id: 7, product_id, quantity_in_stock: stock, reorder_level: reorder }
    }

    #[test]
    fn listed_products_get_catalog_names() {
        let item = InventoryItem::from_record(&record(2, 40, 10), &Catalog::standard(), Utc::now());

        assert_eq!(item.id, "7");
        assert_eq!(item.product_name, "Urban Travel Backpack");
        assert_eq!(item.category, "Backpacks");
        assert!(!item.is_low_stock());
    }

    #[test]
    fn unknown_products_fall_back_to_placeholders() {
        let item = InventoryItem::from_record(&record(42, 3, 5), &Catalog::standard(), Utc::now());

        assert_eq!(item.product_name, "Product 42");
        assert_eq!(item.category, "N/A");
        assert!(item.is_low_stock());
    }

    #[test]
    fn stock_reduction_clamps_at_zero() {
        let item = InventoryItem::from_record(&record(1, 5, 2), &Catalog::standard(), Utc::now());
        assert_eq!(item.reduced_stock(8), 0);
        assert_eq!(item.reduced_stock(2), 3);
        assert_eq!(item.increased_stock(u32::MAX), u32::MAX);
    }

    #[test]
    fn patch_omits_unset_fields_on_the_wire() {
        let patch = InventoryPatch { quantity_in_stock: Some(12), reorder_level: None };
        let encoded = serde_json::to_value(&patch).expect("encode");
        assert_eq!(encoded, serde_json::json!({ "quantityInStock": 12 }));
        assert!(InventoryPatch::default().is_empty());
    }

    #[test]
    fn inventory_ids_must_be_numeric() {
        assert_eq!(parse_inventory_id(" 15 "), Ok(15));
        assert!(parse_inventory_id("abc").is_err());
    }
}
