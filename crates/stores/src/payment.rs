use std::sync::Arc;

use starbags_core::{
    DomainError, IdSequence, NewPayment, NewSavedMethod, Payment, PaymentFilter, PaymentId,
    PaymentPatch, PaymentStats, SavedMethodId, SavedMethodPatch, SavedPaymentMethod,
};
use starbags_db::repositories::{load_collection, save_collection};
use starbags_db::{keys, SnapshotRepository};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::StoreResult;

const PAYMENT: &str = "payment";
const SAVED_METHOD: &str = "saved payment method";

/// Payment ledger plus the customer's saved payment methods.
///
/// Payments are kept newest first; saved methods in the order they were added.
pub struct PaymentStore {
    repository: Arc<dyn SnapshotRepository>,
    payments: RwLock<Vec<Payment>>,
    saved_methods: RwLock<Vec<SavedPaymentMethod>>,
    payment_ids: IdSequence,
    method_ids: IdSequence,
}

impl PaymentStore {
    pub async fn hydrate(repository: Arc<dyn SnapshotRepository>) -> StoreResult<Self> {
        let payments: Vec<Payment> = load_collection(repository.as_ref(), keys::PAYMENTS).await?;
        let saved_methods: Vec<SavedPaymentMethod> =
            load_collection(repository.as_ref(), keys::SAVED_PAYMENT_METHODS).await?;

        let payment_ids =
            IdSequence::seeded(IdSequence::PAYMENT, payments.iter().map(|payment| payment.id.0.as_str()));
        let method_ids = IdSequence::seeded(
            IdSequence::SAVED_METHOD,
            saved_methods.iter().map(|method| method.id.0.as_str()),
        );

        info!(
            event_name = "payment.store.hydrated",
            payments = payments.len(),
            saved_methods = saved_methods.len(),
            "payment store hydrated"
        );
        Ok(Self {
            repository,
            payments: RwLock::new(payments),
            saved_methods: RwLock::new(saved_methods),
            payment_ids,
            method_ids,
        })
    }

    pub async fn add_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        if let Err(error) = payment.validate() {
            warn!(event_name = "payment.create_rejected", error = %error, "payment refused");
            return Err(error.into());
        }
        let payment = payment.into_payment(PaymentId(self.payment_ids.next_id()));

        let mut payments = self.payments.write().await;
        let mut next = Vec::with_capacity(payments.len() + 1);
        next.push(payment.clone());
        next.extend(payments.iter().cloned());
        save_collection(self.repository.as_ref(), keys::PAYMENTS, &next).await?;
        *payments = next;

        info!(
            event_name = "payment.created",
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            status = payment.status.as_str(),
            "payment recorded"
        );
        Ok(payment)
    }

    pub async fn update_payment(&self, id: &str, patch: PaymentPatch) -> StoreResult<Payment> {
        let mut payments = self.payments.write().await;
        let position = payments
            .iter()
            .position(|payment| payment.id.0 == id)
            .ok_or_else(|| DomainError::not_found(PAYMENT, id))?;

        let mut next = payments.clone();
        if let Err(error) = next[position].apply_patch(patch) {
            warn!(event_name = "payment.update_rejected", payment_id = id, error = %error, "payment update refused");
            return Err(error.into());
        }
        save_collection(self.repository.as_ref(), keys::PAYMENTS, &next).await?;
        let updated = next[position].clone();
        *payments = next;

        info!(
            event_name = "payment.updated",
            payment_id = id,
            status = updated.status.as_str(),
            "payment updated"
        );
        Ok(updated)
    }

    pub async fn delete_payment(&self, id: &str) -> StoreResult<()> {
        let mut payments = self.payments.write().await;
        let position = payments
            .iter()
            .position(|payment| payment.id.0 == id)
            .ok_or_else(|| DomainError::not_found(PAYMENT, id))?;

        let mut next = payments.clone();
        next.remove(position);
        save_collection(self.repository.as_ref(), keys::PAYMENTS, &next).await?;
        *payments = next;

        info!(event_name = "payment.deleted", payment_id = id, "payment deleted");
        Ok(())
    }

    pub async fn add_saved_method(&self, method: NewSavedMethod) -> StoreResult<SavedPaymentMethod> {
        let method = method.into_method(SavedMethodId(self.method_ids.next_id()))?;

        let mut methods = self.saved_methods.write().await;
        let mut next = methods.clone();
        next.push(method.clone());
        save_collection(self.repository.as_ref(), keys::SAVED_PAYMENT_METHODS, &next).await?;
        *methods = next;

        info!(event_name = "payment.method_saved", method_id = %method.id, "saved payment method added");
        Ok(method)
    }

    pub async fn update_saved_method(
        &self,
        id: &str,
        patch: SavedMethodPatch,
    ) -> StoreResult<SavedPaymentMethod> {
        let mut methods = self.saved_methods.write().await;
        let position = methods
            .iter()
            .position(|method| method.id.0 == id)
            .ok_or_else(|| DomainError::not_found(SAVED_METHOD, id))?;

        let mut next = methods.clone();
        next[position].apply_patch(patch);
        save_collection(self.repository.as_ref(), keys::SAVED_PAYMENT_METHODS, &next).await?;
        let updated = next[position].clone();
        *methods = next;

        info!(event_name = "payment.method_updated", method_id = id, "saved payment method updated");
        Ok(updated)
    }

    pub async fn delete_saved_method(&self, id: &str) -> StoreResult<()> {
        let mut methods = self.saved_methods.write().await;
        let position = methods
            .iter()
            .position(|method| method.id.0 == id)
            .ok_or_else(|| DomainError::not_found(SAVED_METHOD, id))?;

        let mut next = methods.clone();
        next.remove(position);
        save_collection(self.repository.as_ref(), keys::SAVED_PAYMENT_METHODS, &next).await?;
        *methods = next;

        info!(event_name = "payment.method_deleted", method_id = id, "saved payment method deleted");
        Ok(())
    }

    pub async fn list_payments(&self) -> Vec<Payment> {
        self.payments.read().await.clone()
    }

    pub async fn list_saved_methods(&self) -> Vec<SavedPaymentMethod> {
        self.saved_methods.read().await.clone()
    }

    pub async fn get_payment(&self, id: &str) -> StoreResult<Payment> {
        let payments = self.payments.read().await;
        payments
            .iter()
            .find(|payment| payment.id.0 == id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(PAYMENT, id).into())
    }

    pub async fn stats(&self) -> PaymentStats {
        let payments = self.payments.read().await;
        PaymentStats::collect(payments.iter())
    }

    pub async fn history(&self, filter: &PaymentFilter) -> Vec<Payment> {
        let payments = self.payments.read().await;
        payments.iter().filter(|payment| filter.matches(payment)).cloned().collect()
    }

    /// Inserts records whose ids are not present yet and returns how many were added.
    /// Seeded payments go behind existing ones since they are historical.
    pub async fn seed(
        &self,
        payments: Vec<Payment>,
        methods: Vec<SavedPaymentMethod>,
    ) -> StoreResult<usize> {
        let mut current_payments = self.payments.write().await;
        let mut current_methods = self.saved_methods.write().await;

        let mut next_payments = current_payments.clone();
        for payment in payments {
            if !next_payments.iter().any(|existing| existing.id == payment.id) {
                next_payments.push(payment);
            }
        }
        let mut next_methods = current_methods.clone();
        for method in methods {
            if !next_methods.iter().any(|existing| existing.id == method.id) {
                next_methods.push(method);
            }
        }

        let added_payments = next_payments.len() - current_payments.len();
        let added_methods = next_methods.len() - current_methods.len();
        let added = added_payments + added_methods;
        if added == 0 {
            return Ok(0);
        }

        // Two keys, two writes: each collection is committed as soon as its own save lands.
        if added_payments > 0 {
            save_collection(self.repository.as_ref(), keys::PAYMENTS, &next_payments).await?;
            self.payment_ids.observe_all(next_payments.iter().map(|payment| payment.id.0.as_str()));
            *current_payments = next_payments;
        }
        if added_methods > 0 {
            save_collection(self.repository.as_ref(), keys::SAVED_PAYMENT_METHODS, &next_methods)
                .await?;
            self.method_ids.observe_all(next_methods.iter().map(|method| method.id.0.as_str()));
            *current_methods = next_methods;
        }

        info!(event_name = "payment.seeded", added, "demo payment data seeded");
        Ok(added)
    }
}
