use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SavedMethodId(pub String);

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for SavedMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::validation(format!(
                "unknown payment status `{other}` (expected pending|completed|failed)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    OnlineTransfer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: String,
    pub customer_name: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_ref: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub order_id: String,
    pub customer_name: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub payment_date: NaiveDate,
    pub status: PaymentStatus,
    #[serde(default)]
    pub transaction_ref: String,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.order_id.trim().is_empty() {
            return Err(DomainError::validation("orderId is required"));
        }
        if self.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customerName is required"));
        }
        if self.amount < Decimal::ZERO {
            return Err(DomainError::validation("amount must not be negative"));
        }
        Ok(())
    }

    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            order_id: self.order_id,
            customer_name: self.customer_name,
            amount: self.amount,
            method: self.method,
            payment_date: self.payment_date,
            status: self.status,
            transaction_ref: self.transaction_ref,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub transaction_ref: Option<String>,
}

impl Payment {
    /// Any field may change, status included; payments have no lifecycle rules.
    pub fn apply_patch(&mut self, patch: PaymentPatch) -> Result<(), DomainError> {
        if matches!(patch.amount, Some(amount) if amount < Decimal::ZERO) {
            return Err(DomainError::validation("amount must not be negative"));
        }
        if let Some(order_id) = patch.order_id {
            self.order_id = order_id;
        }
        if let Some(customer_name) = patch.customer_name {
            self.customer_name = customer_name;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(payment_date) = patch.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(transaction_ref) = patch.transaction_ref {
            self.transaction_ref = transaction_ref;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPaymentMethod {
    pub id: SavedMethodId,
    pub method_type: PaymentMethod,
    pub card_holder_name: String,
    pub masked_card_number: String,
    pub expiry_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedMethod {
    pub method_type: PaymentMethod,
    pub card_holder_name: String,
    /// Raw or already masked; only the last four digits are kept.
    pub card_number: String,
    pub expiry_date: String,
}

impl NewSavedMethod {
    pub fn into_method(self, id: SavedMethodId) -> Result<SavedPaymentMethod, DomainError> {
        if self.card_holder_name.trim().is_empty() {
            return Err(DomainError::validation("cardHolderName is required"));
        }
        Ok(SavedPaymentMethod {
            id,
            method_type: self.method_type,
            card_holder_name: self.card_holder_name,
            masked_card_number: mask_card_number(&self.card_number),
            expiry_date: self.expiry_date,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMethodPatch {
    #[serde(default)]
    pub method_type: Option<PaymentMethod>,
    #[serde(default)]
    pub card_holder_name: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl SavedPaymentMethod {
    pub fn apply_patch(&mut self, patch: SavedMethodPatch) {
        if let Some(method_type) = patch.method_type {
            self.method_type = method_type;
        }
        if let Some(card_holder_name) = patch.card_holder_name {
            self.card_holder_name = card_holder_name;
        }
        if let Some(card_number) = patch.card_number {
            self.masked_card_number = mask_card_number(&card_number);
        }
        if let Some(expiry_date) = patch.expiry_date {
            self.expiry_date = expiry_date;
        }
    }
}

pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().filter(char::is_ascii_digit).collect();
    let last_four: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("**** **** **** {last_four}")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStats {
    pub total_revenue: Decimal,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

impl PaymentStats {
    pub fn collect<'a, I>(payments: I) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        payments.into_iter().fold(Self::default(), |mut stats, payment| {
            match payment.status {
                PaymentStatus::Pending => stats.pending += 1,
                PaymentStatus::Completed => {
                    stats.completed += 1;
                    stats.total_revenue += payment.amount;
                }
                PaymentStatus::Failed => stats.failed += 1,
            }
            stats
        })
    }
}

/// History filter; every criterion is optional and date bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub search: Option<String>,
    pub status: Option<PaymentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&payment.id.0, &payment.order_id, &payment.customer_name, &payment.transaction_ref]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        };
        let matches_status = self.status.map_or(true, |status| payment.status == status);
        let matches_from = self.date_from.map_or(true, |from| payment.payment_date >= from);
        let matches_to = self.date_to.map_or(true, |to| payment.payment_date <= to);

        matches_search && matches_status && matches_from && matches_to
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{
        mask_card_number, NewPayment, Payment, PaymentFilter, PaymentId, PaymentMethod,
        PaymentPatch, PaymentStats, PaymentStatus,
    };

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).expect("valid date")
    }

    fn payment(id: &str, customer: &str, cents: i64, status: PaymentStatus, day: u32) -> Payment {
        NewPayment {
            order_id: format!("ORD-{id}"),
            customer_name: customer.to_owned(),
            amount: Decimal::new(cents, 2),
            method: PaymentMethod::Card,
            payment_date: date(day),
            status,
            transaction_ref: format!("TXN-{id}"),
        }
        .into_payment(PaymentId(format!("PAY-{id}")))
    }

    #[test]
    fn stats_count_statuses_and_sum_completed_revenue() {
        let payments = vec![
            payment("001", "Acme Corp", 250_000, PaymentStatus::Completed, 1),
            payment("002", "Globe Industries", 180_000, PaymentStatus::Pending, 3),
            payment("003", "Star Retail", 95_000, PaymentStatus::Completed, 5),
            payment("004", "Urban Outfitters", 320_000, PaymentStatus::Failed, 7),
        ];

        let stats = PaymentStats::collect(&payments);
        assert_eq!(stats.total_revenue, Decimal::from(3_450));
        assert_eq!((stats.pending, stats.completed, stats.failed), (1, 2, 1));
    }

    #[test]
    fn filter_combines_search_status_and_date_range() {
        let payments = vec![
            payment("001", "Acme Corp", 250_000, PaymentStatus::Completed, 1),
            payment("002", "Globe Industries", 180_000, PaymentStatus::Pending, 3),
            payment("003", "Star Retail", 95_000, PaymentStatus::Completed, 5),
        ];

        let filter = PaymentFilter {
            status: Some(PaymentStatus::Completed),
            date_from: Some(date(2)),
            ..PaymentFilter::default()
        };
        let hits: Vec<_> = payments.iter().filter(|p| filter.matches(p)).map(|p| p.id.0.as_str()).collect();
        assert_eq!(hits, vec!["PAY-003"]);

        let by_ref = PaymentFilter { search: Some("txn-002".to_owned()), ..PaymentFilter::default() };
        assert!(by_ref.matches(&payments[1]));
        assert!(!by_ref.matches(&payments[0]));
    }

    #[test]
    fn status_is_freely_settable() {
        let mut record = payment("009", "BagWorld Inc.", 410_000, PaymentStatus::Failed, 9);
        record
            .apply_patch(PaymentPatch { status: Some(PaymentStatus::Pending), ..PaymentPatch::default() })
            .expect("failed -> pending allowed");
        assert_eq!(record.status, PaymentStatus::Pending);

        let error = record.apply_patch(PaymentPatch {
            amount: Some(Decimal::from(-1)),
            ..PaymentPatch::default()
        });
        assert!(error.is_err());
        assert_eq!(record.amount, Decimal::from(4_100));
    }

    #[test]
    fn card_numbers_keep_last_four_digits() {
        assert_eq!(mask_card_number("4242 4242 4242 4242"), "**** **** **** 4242");
        assert_eq!(mask_card_number("**** **** **** 1234"), "**** **** **** 1234");
        assert_eq!(mask_card_number("12"), "**** **** **** 12");
    }

    #[test]
    fn legacy_payment_record_decodes() {
        let raw = r#"{"id":"PAY-002","orderId":"ORD-002","customerName":"Globe Industries",
            "amount":1800.0,"method":"online_transfer","paymentDate":"2026-02-03",
            "status":"pending","transactionRef":"TXN-DEF456"}"#;
        let payment: Payment = serde_json::from_str(raw).expect("decodes");
        assert_eq!(payment.method, PaymentMethod::OnlineTransfer);
        assert_eq!(payment.payment_date, date(3));
    }
}
