use std::sync::Arc;

use starbags_core::{DomainError, IdSequence, Order, OrderId, OrderStatus};
use starbags_db::repositories::{load_collection, save_collection};
use starbags_db::{keys, SnapshotRepository};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::StoreResult;

const ENTITY: &str = "order";

/// Orders created from quotations (and, later, the cart).
pub struct OrderStore {
    repository: Arc<dyn SnapshotRepository>,
    orders: RwLock<Vec<Order>>,
    ids: IdSequence,
}

impl OrderStore {
    pub async fn hydrate(repository: Arc<dyn SnapshotRepository>) -> StoreResult<Self> {
        let orders: Vec<Order> = load_collection(repository.as_ref(), keys::ORDERS).await?;
        let ids = IdSequence::seeded(IdSequence::ORDER, orders.iter().map(|order| order.id.0.as_str()));

        info!(event_name = "order.store.hydrated", count = orders.len(), "order store hydrated");
        Ok(Self { repository, orders: RwLock::new(orders), ids })
    }

    pub fn next_order_id(&self) -> OrderId {
        OrderId(self.ids.next_id())
    }

    pub async fn append(&self, order: Order) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|existing| existing.id == order.id) {
            return Err(DomainError::validation(format!("order `{}` already exists", order.id)).into());
        }

        let mut next = orders.clone();
        next.push(order.clone());
        save_collection(self.repository.as_ref(), keys::ORDERS, &next).await?;
        *orders = next;
        self.ids.observe(&order.id.0);

        info!(
            event_name = "order.created",
            order_id = %order.id,
            total = %order.total,
            items = order.items.len(),
            "order appended"
        );
        Ok(order)
    }

    pub async fn list_orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    /// Newest first.
    pub async fn list_recent(&self) -> Vec<Order> {
        let mut orders = self.list_orders().await;
        orders.sort_by(|left, right| right.date.cmp(&left.date));
        orders
    }

    pub async fn get_order(&self, id: &str) -> StoreResult<Order> {
        let orders = self.orders.read().await;
        orders
            .iter()
            .find(|order| order.id.0 == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
    }

    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<Order> {
        let mut orders = self.orders.write().await;
        let position = orders
            .iter()
            .position(|order| order.id.0 == id)
            .ok_or_else(|| DomainError::not_found(ENTITY, id))?;

        let mut next = orders.clone();
        if let Err(error) = next[position].transition_to(status) {
            warn!(event_name = "order.status_rejected", order_id = id, error = %error, "order status change refused");
            return Err(error.into());
        }
        save_collection(self.repository.as_ref(), keys::ORDERS, &next).await?;
        let updated = next[position].clone();
        *orders = next;

        info!(event_name = "order.status_changed", order_id = id, status = %status, "order status updated");
        Ok(updated)
    }
}
