use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::order::OrderId;
use crate::domain::product::ProductId;
use crate::errors::DomainError;
use crate::pricing::{calculate_totals, line_total, Totals};

const ENTITY: &str = "quotation";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(pub String);

impl std::fmt::Display for QuotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Draft,
    Approved,
    Rejected,
    Converted,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Converted => "converted",
        }
    }

    /// Legal lifecycle edges. Re-rejecting is allowed so a reason can be overwritten.
    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Approved)
                | (Self::Draft, Self::Rejected)
                | (Self::Approved, Self::Converted)
                | (Self::Rejected, Self::Rejected)
        )
    }

    /// Approved and converted quotations can no longer be edited.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Approved | Self::Converted)
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuotationStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "converted" => Ok(Self::Converted),
            other => Err(DomainError::validation(format!(
                "unknown quotation status `{other}` (expected draft|approved|rejected|converted)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Percentage in `0..=100`.
    pub discount: Decimal,
    pub total: Decimal,
}

impl QuotationItem {
    /// Fails when the line total does not fit in a `Decimal`; the item is left unchanged.
    pub fn recalculate(&mut self, position: usize) -> Result<(), DomainError> {
        self.total = line_total(self.quantity, self.unit_price, self.discount).ok_or_else(|| {
            DomainError::validation(format!("items[{position}] total exceeds representable amount"))
        })?;
        Ok(())
    }
}

/// Line as submitted by a requester or edited by an admin. Missing price and name fall back
/// to the catalog entry; a missing discount means none.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemInput {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Decimal>,
}

impl QuotationItemInput {
    pub fn resolve(self, position: usize, catalog: &Catalog) -> Result<QuotationItem, DomainError> {
        let field = |name: &str| format!("items[{position}].{name}");

        if self.product_id.0.trim().is_empty() {
            return Err(DomainError::validation(format!("{} is required", field("productId"))));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation(format!(
                "{} must be greater than zero",
                field("quantity")
            )));
        }

        let listed = catalog.find(&self.product_id);
        let unit_price = match (self.unit_price, listed) {
            (Some(price), _) => price,
            (None, Some(product)) => product.price,
            (None, None) => {
                return Err(DomainError::validation(format!(
                    "{} is required for unlisted product `{}`",
                    field("unitPrice"),
                    self.product_id
                )));
            }
        };
        if unit_price < Decimal::ZERO {
            return Err(DomainError::validation(format!("{} must not be negative", field("unitPrice"))));
        }

        let discount = self.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || discount > Decimal::from(100) {
            return Err(DomainError::validation(format!(
                "{} must be within 0..=100",
                field("discount")
            )));
        }

        let product_name = self
            .product_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| listed.map(|product| product.name.clone()))
            .unwrap_or_else(|| format!("Product {}", self.product_id));

        let mut item = QuotationItem {
            product_id: self.product_id,
            product_name,
            quantity: self.quantity,
            unit_price,
            discount,
            total: Decimal::ZERO,
        };
        item.recalculate(position)?;
        Ok(item)
    }
}

fn checked_totals(items: &[QuotationItem]) -> Result<Totals, DomainError> {
    calculate_totals(items)
        .ok_or_else(|| DomainError::validation("quotation total exceeds representable amount"))
}

fn resolve_items(
    inputs: Vec<QuotationItemInput>,
    catalog: &Catalog,
) -> Result<Vec<QuotationItem>, DomainError> {
    if inputs.is_empty() {
        return Err(DomainError::validation("at least one item is required"));
    }
    inputs.into_iter().enumerate().map(|(position, input)| input.resolve(position, catalog)).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRequest {
    pub company_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub special_notes: String,
    #[serde(default)]
    pub user_id: String,
    pub items: Vec<QuotationItemInput>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub special_notes: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<QuotationItemInput>>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: QuotationId,
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub items: Vec<QuotationItem>,
    #[serde(default)]
    pub special_notes: String,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_order_id: Option<OrderId>,
}

impl Quotation {
    pub fn create(
        id: QuotationId,
        request: QuotationRequest,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if request.company_name.trim().is_empty() {
            return Err(DomainError::validation("companyName is required"));
        }
        let items = resolve_items(request.items, catalog)?;

        let mut quotation = Self {
            id,
            company_name: request.company_name,
            contact_person: request.contact_person,
            email: request.email,
            phone: request.phone,
            items,
            special_notes: request.special_notes,
            subtotal: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            status: QuotationStatus::Draft,
            created_at: now,
            updated_at: now,
            user_id: request.user_id,
            admin_notes: None,
            rejection_reason: None,
            converted_order_id: None,
        };
        quotation.recalculate()?;
        Ok(quotation)
    }

    /// Recomputes every line total plus the record's subtotal and total amount.
    pub fn recalculate(&mut self) -> Result<(), DomainError> {
        for (position, item) in self.items.iter_mut().enumerate() {
            item.recalculate(position)?;
        }
        let totals = checked_totals(&self.items)?;
        self.subtotal = totals.subtotal;
        self.total_amount = totals.total_amount;
        Ok(())
    }

    /// Applies a partial edit. Nothing is changed when an error is returned.
    pub fn apply_patch(
        &mut self,
        patch: QuotationPatch,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.status.is_locked() {
            return Err(DomainError::Locked {
                entity: ENTITY,
                id: self.id.0.clone(),
                status: self.status.to_string(),
            });
        }
        if patch.admin_notes.is_some() && self.status != QuotationStatus::Draft {
            return Err(DomainError::validation(format!(
                "adminNotes can only be set on draft quotations (quotation `{}` is {})",
                self.id, self.status
            )));
        }
        if matches!(&patch.company_name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::validation("companyName must not be blank"));
        }
        let items = patch.items.map(|inputs| resolve_items(inputs, catalog)).transpose()?;
        let totals = items.as_deref().map(checked_totals).transpose()?;

        if let Some(company_name) = patch.company_name {
            self.company_name = company_name;
        }
        if let Some(contact_person) = patch.contact_person {
            self.contact_person = contact_person;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(special_notes) = patch.special_notes {
            self.special_notes = special_notes;
        }
        if let Some(admin_notes) = patch.admin_notes {
            self.admin_notes = Some(admin_notes);
        }
        if let (Some(items), Some(totals)) = (items, totals) {
            self.items = items;
            self.subtotal = totals.subtotal;
            self.total_amount = totals.total_amount;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Status change requested by an admin. Conversion is excluded because it has to go
    /// together with the creation of an order, see [`Quotation::mark_converted`].
    pub fn transition_to(
        &mut self,
        next: QuotationStatus,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if next == QuotationStatus::Converted || !self.status.can_transition_to(next) {
            return Err(self.invalid_transition(next));
        }

        self.status = next;
        if next == QuotationStatus::Rejected {
            if let Some(reason) = reason.map(str::trim).filter(|reason| !reason.is_empty()) {
                self.rejection_reason = Some(reason.to_owned());
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Only approved quotations can become orders.
    pub fn ensure_convertible(&self) -> Result<(), DomainError> {
        if self.status.can_transition_to(QuotationStatus::Converted) {
            Ok(())
        } else {
            Err(self.invalid_transition(QuotationStatus::Converted))
        }
    }

    pub fn mark_converted(&mut self, order_id: OrderId, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_convertible()?;

        self.status = QuotationStatus::Converted;
        self.converted_order_id = Some(order_id);
        self.updated_at = now;
        Ok(())
    }

    pub fn is_deletable(&self) -> bool {
        self.status == QuotationStatus::Rejected
    }

    /// Case-insensitive match on id, company or contact person.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.id.0, &self.company_name, &self.contact_person]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    pub fn invalid_transition(&self, next: QuotationStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: ENTITY,
            from: self.status.to_string(),
            to: next.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationStats {
    pub total: usize,
    pub draft: usize,
    pub approved: usize,
    pub rejected: usize,
    pub converted: usize,
}

impl QuotationStats {
    pub fn collect<'a, I>(quotations: I) -> Self
    where
        I: IntoIterator<Item = &'a Quotation>,
    {
        quotations.into_iter().fold(Self::default(), |mut stats, quotation| {
            stats.total += 1;
            match quotation.status {
                QuotationStatus::Draft => stats.draft += 1,
                QuotationStatus::Approved => stats.approved += 1,
                QuotationStatus::Rejected => stats.rejected += 1,
                QuotationStatus::Converted => stats.converted += 1,
            }
            stats
        })
    }
}
