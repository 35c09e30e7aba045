//! Quotation lifecycle: draft proposals that admins price, approve or reject, and finally
//! convert into orders.
//!
//! Every mutation is computed on a copy of the collection, persisted as one snapshot, and only
//! then committed to memory. A refused or failed mutation therefore leaves the store exactly as
//! it was.

use std::sync::Arc;

use chrono::Utc;
use starbags_core::{
    AuditEvent, AuditOutcome, AuditSink, Catalog, DomainError, IdSequence, Order, OrderId,
    Quotation, QuotationId, QuotationPatch, QuotationRequest, QuotationStats, QuotationStatus,
};
use starbags_db::repositories::{load_collection, save_collection};
use starbags_db::{keys, SnapshotRepository};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::order::OrderStore;

const ENTITY: &str = "quotation";
const ACTOR: &str = "starbags";

pub struct QuotationStore {
    repository: Arc<dyn SnapshotRepository>,
    quotations: RwLock<Vec<Quotation>>,
    ids: IdSequence,
    orders: Arc<OrderStore>,
    catalog: Arc<Catalog>,
    audit: Arc<dyn AuditSink>,
}

impl QuotationStore {
    pub async fn hydrate(
        repository: Arc<dyn SnapshotRepository>,
        orders: Arc<OrderStore>,
        catalog: Arc<Catalog>,
        audit: Arc<dyn AuditSink>,
    ) -> StoreResult<Self> {
        let quotations: Vec<Quotation> = load_collection(repository.as_ref(), keys::QUOTATIONS).await?;
        let ids = IdSequence::seeded(
            IdSequence::QUOTATION,
            quotations.iter().map(|quotation| quotation.id.0.as_str()),
        );

        info!(
            event_name = "quotation.store.hydrated",
            count = quotations.len(),
            "quotation store hydrated"
        );
        Ok(Self { repository, quotations: RwLock::new(quotations), ids, orders, catalog, audit })
    }

    pub async fn create_quotation(&self, request: QuotationRequest) -> StoreResult<Quotation> {
        let correlation_id = new_correlation_id();
        let id = QuotationId(self.ids.next_id());
        let quotation = Quotation::create(id.clone(), request, &self.catalog, Utc::now())
            .map_err(|error| self.refuse(&id.0, &correlation_id, "quotation.created", error))?;

        let mut quotations = self.quotations.write().await;
        let mut next = quotations.clone();
        next.push(quotation.clone());
        self.persist(&next, &id.0, &correlation_id).await?;
        *quotations = next;

        info!(
            event_name = "quotation.created",
            quotation_id = %quotation.id,
            correlation_id = %correlation_id,
            user_id = %quotation.user_id,
            total_amount = %quotation.total_amount,
            "quotation created"
        );
        self.audit.emit(
            AuditEvent::new(&id.0, &correlation_id, "quotation.created", ACTOR, AuditOutcome::Success)
                .with_metadata("total_amount", quotation.total_amount.to_string()),
        );
        Ok(quotation)
    }

    /// Edits contact details, notes or items of a draft or rejected quotation.
    pub async fn update_quotation(&self, id: &str, patch: QuotationPatch) -> StoreResult<Quotation> {
        let correlation_id = new_correlation_id();
        let mut quotations = self.quotations.write().await;
        let position = self.position(&quotations, id, &correlation_id, "quotation.updated")?;

        let mut next = quotations.clone();
        next[position]
            .apply_patch(patch, &self.catalog, Utc::now())
            .map_err(|error| self.refuse(id, &correlation_id, "quotation.updated", error))?;
        self.persist(&next, id, &correlation_id).await?;
        let updated = next[position].clone();
        *quotations = next;

        info!(
            event_name = "quotation.updated",
            quotation_id = id,
            correlation_id = %correlation_id,
            total_amount = %updated.total_amount,
            "quotation updated"
        );
        self.audit.emit(AuditEvent::new(
            id,
            &correlation_id,
            "quotation.updated",
            ACTOR,
            AuditOutcome::Success,
        ));
        Ok(updated)
    }

    /// Approves or rejects. Repeating a rejection overwrites the reason.
    pub async fn update_quotation_status(
        &self,
        id: &str,
        status: QuotationStatus,
        reason: Option<&str>,
    ) -> StoreResult<Quotation> {
        let correlation_id = new_correlation_id();
        let mut quotations = self.quotations.write().await;
        let position = self.position(&quotations, id, &correlation_id, "quotation.status_changed")?;

        let mut next = quotations.clone();
        let from = next[position].status;
        next[position]
            .transition_to(status, reason, Utc::now())
            .map_err(|error| self.refuse(id, &correlation_id, "quotation.status_changed", error))?;
        self.persist(&next, id, &correlation_id).await?;
        let updated = next[position].clone();
        *quotations = next;

        info!(
            event_name = "quotation.status_changed",
            quotation_id = id,
            correlation_id = %correlation_id,
            from = %from,
            to = %status,
            "quotation status changed"
        );
        let mut event = AuditEvent::new(
            id,
            &correlation_id,
            "quotation.status_changed",
            ACTOR,
            AuditOutcome::Success,
        )
        .with_metadata("from", from.as_str())
        .with_metadata("to", status.as_str());
        if let Some(reason) = &updated.rejection_reason {
            event = event.with_metadata("reason", reason.as_str());
        }
        self.audit.emit(event);
        Ok(updated)
    }

    /// Only rejected quotations can be deleted.
    pub async fn delete_quotation(&self, id: &str) -> StoreResult<()> {
        let correlation_id = new_correlation_id();
        let mut quotations = self.quotations.write().await;
        let position = self.position(&quotations, id, &correlation_id, "quotation.deleted")?;

        if !quotations[position].is_deletable() {
            let error = DomainError::InvalidTransition {
                entity: ENTITY,
                from: quotations[position].status.to_string(),
                to: "deleted".to_owned(),
            };
            return Err(self.refuse(id, &correlation_id, "quotation.deleted", error));
        }

        let mut next = quotations.clone();
        next.remove(position);
        self.persist(&next, id, &correlation_id).await?;
        *quotations = next;

        info!(
            event_name = "quotation.deleted",
            quotation_id = id,
            correlation_id = %correlation_id,
            "quotation deleted"
        );
        self.audit.emit(AuditEvent::new(
            id,
            &correlation_id,
            "quotation.deleted",
            ACTOR,
            AuditOutcome::Success,
        ));
        Ok(())
    }

    /// Turns an approved quotation into a `Processing` order and returns the new order id.
    ///
    /// The order is written before the quotation is flipped to `converted`.
    pub async fn convert_to_order(&self, id: &str) -> StoreResult<OrderId> {
        let correlation_id = new_correlation_id();
        let mut quotations = self.quotations.write().await;
        let position = self.position(&quotations, id, &correlation_id, "quotation.converted")?;

        quotations[position]
            .ensure_convertible()
            .map_err(|error| self.refuse(id, &correlation_id, "quotation.converted", error))?;

        let now = Utc::now();
        let order_id = self.orders.next_order_id();
        let mut next = quotations.clone();
        next[position]
            .mark_converted(order_id.clone(), now)
            .map_err(|error| self.refuse(id, &correlation_id, "quotation.converted", error))?;

        let order = Order::from_quotation(order_id.clone(), &quotations[position], now);
        self.orders.append(order).await?;
        self.persist(&next, id, &correlation_id).await?;
        *quotations = next;

        info!(
            event_name = "quotation.converted",
            quotation_id = id,
            order_id = %order_id,
            correlation_id = %correlation_id,
            "quotation converted to order"
        );
        self.audit.emit(
            AuditEvent::new(id, &correlation_id, "quotation.converted", ACTOR, AuditOutcome::Success)
                .with_metadata("order_id", order_id.0.as_str()),
        );
        Ok(order_id)
    }

    /// Quotations belonging to `user_id`, in the order they were created.
    pub async fn get_quotations_by_user(&self, user_id: &str) -> Vec<Quotation> {
        let quotations = self.quotations.read().await;
        quotations.iter().filter(|quotation| quotation.user_id == user_id).cloned().collect()
    }

    pub async fn get_quotation(&self, id: &str) -> StoreResult<Quotation> {
        let quotations = self.quotations.read().await;
        quotations
            .iter()
            .find(|quotation| quotation.id.0 == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(ENTITY, id).into())
    }

    pub async fn list_quotations(&self) -> Vec<Quotation> {
        self.quotations.read().await.clone()
    }

    /// Case-insensitive match on id, company and contact person, newest first.
    pub async fn search(&self, term: &str) -> Vec<Quotation> {
        let quotations = self.quotations.read().await;
        let mut matches: Vec<Quotation> =
            quotations.iter().filter(|quotation| quotation.matches_search(term)).cloned().collect();
        matches.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        matches
    }

    pub async fn stats(&self) -> QuotationStats {
        let quotations = self.quotations.read().await;
        QuotationStats::collect(quotations.iter())
    }

    fn position(
        &self,
        quotations: &[Quotation],
        id: &str,
        correlation_id: &str,
        event_type: &str,
    ) -> StoreResult<usize> {
        quotations
            .iter()
            .position(|quotation| quotation.id.0 == id)
            .ok_or_else(|| self.refuse(id, correlation_id, event_type, DomainError::not_found(ENTITY, id)))
    }

    fn refuse(&self, id: &str, correlation_id: &str, event_type: &str, error: DomainError) -> StoreError {
        warn!(
            event_name = "quotation.mutation_rejected",
            quotation_id = id,
            correlation_id = correlation_id,
            attempted = event_type,
            error = %error,
            "quotation mutation refused"
        );
        self.audit.emit(
            AuditEvent::new(id, correlation_id, event_type, ACTOR, AuditOutcome::Rejected)
                .with_metadata("reason", error.to_string()),
        );
        error.into()
    }

    async fn persist(&self, quotations: &[Quotation], id: &str, correlation_id: &str) -> StoreResult<()> {
        if let Err(failure) = save_collection(self.repository.as_ref(), keys::QUOTATIONS, quotations).await {
            error!(
                event_name = "quotation.persist_failed",
                quotation_id = id,
                correlation_id = correlation_id,
                error = %failure,
                "quotation snapshot could not be saved"
            );
            self.audit.emit(
                AuditEvent::new(id, correlation_id, "quotation.persisted", ACTOR, AuditOutcome::Failed)
                    .with_metadata("error", failure.to_string()),
            );
            return Err(failure.into());
        }
        Ok(())
    }
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}
