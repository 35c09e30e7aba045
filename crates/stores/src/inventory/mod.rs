//! Stock levels held by the remote inventory service, cached locally with display names.

mod client;

use std::sync::Arc;

use chrono::Utc;
use starbags_core::domain::inventory::{parse_inventory_id, parse_product_id};
use starbags_core::{
    Catalog, DomainError, InventoryItem, InventoryPatch, InventoryRecord, NewInventoryRecord,
    ProductId,
};
use tokio::sync::RwLock;
use tracing::{error, info};

pub use client::{HttpInventoryApi, InventoryApi, InventoryApiError};

use crate::error::{StoreError, StoreResult};

const ENTITY: &str = "inventory item";

pub struct InventoryStore {
    api: Arc<dyn InventoryApi>,
    catalog: Arc<Catalog>,
    items: RwLock<Vec<InventoryItem>>,
}

impl InventoryStore {
    pub fn new(api: Arc<dyn InventoryApi>, catalog: Arc<Catalog>) -> Self {
        Self { api, catalog, items: RwLock::new(Vec::new()) }
    }

    /// Replaces the cache with the service's current list.
    pub async fn refresh(&self) -> StoreResult<Vec<InventoryItem>> {
        let records = self.api.list().await.map_err(|failure| network_failure("list", failure))?;
        let now = Utc::now();
        let refreshed: Vec<InventoryItem> =
            records.iter().map(|record| InventoryItem::from_record(record, &self.catalog, now)).collect();

        let mut items = self.items.write().await;
        *items = refreshed.clone();

        info!(event_name = "inventory.refreshed", count = refreshed.len(), "inventory cache refreshed");
        Ok(refreshed)
    }

    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity_in_stock: u32,
        reorder_level: u32,
    ) -> StoreResult<InventoryItem> {
        let record = NewInventoryRecord {
            product_id: parse_product_id(product_id)?,
            quantity_in_stock,
            reorder_level,
        };
        let created = self.api.create(&record).await.map_err(|failure| network_failure("create", failure))?;
        let item = InventoryItem::from_record(&created, &self.catalog, Utc::now());

        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }

        info!(
            event_name = "inventory.created",
            inventory_id = %item.id,
            product_id = %item.product_id,
            quantity_in_stock = item.quantity_in_stock,
            "inventory item created"
        );
        Ok(item)
    }

    pub async fn update_item(&self, id: &str, patch: InventoryPatch) -> StoreResult<InventoryItem> {
        let inventory_id = parse_inventory_id(id)?;
        if patch.is_empty() {
            return Err(DomainError::validation("inventory update needs quantityInStock or reorderLevel").into());
        }
        self.cached(id).await?;

        let updated = self
            .api
            .update(inventory_id, &patch)
            .await
            .map_err(|failure| network_failure("update", failure))?;
        self.reconcile(id, &updated).await
    }

    pub async fn delete_item(&self, id: &str) -> StoreResult<()> {
        let inventory_id = parse_inventory_id(id)?;
        self.cached(id).await?;

        self.api.delete(inventory_id).await.map_err(|failure| network_failure("delete", failure))?;

        let mut items = self.items.write().await;
        items.retain(|item| item.id != id);

        info!(event_name = "inventory.deleted", inventory_id = id, "inventory item deleted");
        Ok(())
    }

    pub async fn increase_stock(&self, id: &str, amount: u32) -> StoreResult<InventoryItem> {
        let item = self.cached(id).await?;
        let patch =
            InventoryPatch { quantity_in_stock: Some(item.increased_stock(amount)), reorder_level: None };
        self.update_item(id, patch).await
    }

    /// Clamps at zero instead of failing when `amount` exceeds the stock.
    pub async fn reduce_stock(&self, id: &str, amount: u32) -> StoreResult<InventoryItem> {
        let item = self.cached(id).await?;
        let patch =
            InventoryPatch { quantity_in_stock: Some(item.reduced_stock(amount)), reorder_level: None };
        self.update_item(id, patch).await
    }

    pub async fn get_item(&self, id: &str) -> Option<InventoryItem> {
        let items = self.items.read().await;
        items.iter().find(|item| item.id == id).cloned()
    }

    pub async fn list_items(&self) -> Vec<InventoryItem> {
        self.items.read().await.clone()
    }

    pub async fn low_stock_items(&self) -> Vec<InventoryItem> {
        let items = self.items.read().await;
        items.iter().filter(|item| item.is_low_stock()).cloned().collect()
    }

    async fn cached(&self, id: &str) -> StoreResult<InventoryItem> {
        self.get_item(id).await.ok_or_else(|| DomainError::not_found(ENTITY, id).into())
    }

    async fn reconcile(&self, id: &str, record: &InventoryRecord) -> StoreResult<InventoryItem> {
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| DomainError::not_found(ENTITY, id))?;
        item.reconcile(record, Utc::now());

        info!(
            event_name = "inventory.updated",
            inventory_id = id,
            quantity_in_stock = item.quantity_in_stock,
            reorder_level = item.reorder_level,
            "inventory item updated"
        );
        Ok(item.clone())
    }
}

fn network_failure(operation: &'static str, failure: InventoryApiError) -> StoreError {
    error!(
        event_name = "inventory.request_failed",
        operation,
        status = failure.status().map(|status| status.as_u16()),
        error = %failure,
        "inventory service call failed"
    );
    failure.into()
}
