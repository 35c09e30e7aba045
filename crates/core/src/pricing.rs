use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::quotation::QuotationItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub total_amount: Decimal,
}

/// Fraction of the list price the customer pays, e.g. `0.90` for a 10% discount.
pub fn discount_factor(discount_pct: Decimal) -> Decimal {
    Decimal::ONE - discount_pct / Decimal::from(100)
}

pub fn discounted_unit_price(unit_price: Decimal, discount_pct: Decimal) -> Decimal {
    unit_price * discount_factor(discount_pct)
}

/// `None` when the product does not fit in a `Decimal`.
pub fn line_subtotal(quantity: u32, unit_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(unit_price)
}

pub fn line_total(quantity: u32, unit_price: Decimal, discount_pct: Decimal) -> Option<Decimal> {
    line_subtotal(quantity, unit_price)?.checked_mul(discount_factor(discount_pct))
}

/// `None` when any line or either sum overflows.
pub fn calculate_totals(items: &[QuotationItem]) -> Option<Totals> {
    let mut totals = Totals { subtotal: Decimal::ZERO, total_amount: Decimal::ZERO };
    for item in items {
        let subtotal = line_subtotal(item.quantity, item.unit_price)?;
        let total = line_total(item.quantity, item.unit_price, item.discount)?;
        totals.subtotal = totals.subtotal.checked_add(subtotal)?;
        totals.total_amount = totals.total_amount.checked_add(total)?;
    }
    Some(totals)
}

/// Display rounding only; stored totals stay exact.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
