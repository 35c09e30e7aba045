use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use starbags_core::{
    Payment, PaymentId, PaymentMethod, PaymentStatus, SavedMethodId, SavedPaymentMethod,
};
use starbags_stores::Application;

use crate::commands::{execute, store_failure, CommandResult, Outcome};

pub fn run() -> CommandResult {
    execute("seed", seed)
}

async fn seed(app: Application) -> Outcome {
    let payments = demo_payments();
    let methods = demo_saved_methods();
    let offered = payments.len() + methods.len();

    let added = app.payments.seed(payments, methods).await.map_err(store_failure)?;
    let message = if added == 0 {
        "demo data already present".to_string()
    } else {
        format!("seeded {added} demo record(s)")
    };
    Ok((message, Some(json!({ "added": added, "skipped": offered - added }))))
}

fn demo_payments() -> Vec<Payment> {
    use PaymentMethod::{Card, Cash, OnlineTransfer};
    use PaymentStatus::{Completed, Failed, Pending};

    let rows = [
        ("PAY-001", "ORD-001", "Acme Corp", 2500, Card, (2026, 2, 1), Completed, "TXN-ABC123"),
        ("PAY-002", "ORD-002", "Globe Industries", 1800, OnlineTransfer, (2026, 2, 3), Pending, "TXN-DEF456"),
        ("PAY-003", "ORD-003", "Star Retail", 950, Cash, (2026, 2, 5), Completed, "TXN-GHI789"),
        ("PAY-004", "ORD-004", "Urban Outfitters", 3200, Card, (2026, 2, 7), Failed, "TXN-JKL012"),
        ("PAY-005", "ORD-005", "BagWorld Inc.", 4100, OnlineTransfer, (2026, 1, 28), Completed, "TXN-MNO345"),
    ];

    rows.into_iter()
        .filter_map(|(id, order_id, customer, amount, method, (year, month, day), status, reference)| {
            let payment_date = NaiveDate::from_ymd_opt(year, month, day)?;
            Some(Payment {
                id: PaymentId(id.to_string()),
                order_id: order_id.to_string(),
                customer_name: customer.to_string(),
                amount: Decimal::from(amount),
                method,
                payment_date,
                status,
                transaction_ref: reference.to_string(),
            })
        })
        .collect()
}

fn demo_saved_methods() -> Vec<SavedPaymentMethod> {
    vec![
        SavedPaymentMethod {
            id: SavedMethodId("SPM-001".to_string()),
            method_type: PaymentMethod::Card,
            card_holder_name: "John Smith".to_string(),
            masked_card_number: "**** **** **** 4242".to_string(),
            expiry_date: "12/27".to_string(),
        },
        SavedPaymentMethod {
            id: SavedMethodId("SPM-002".to_string()),
            method_type: PaymentMethod::Card,
            card_holder_name: "Jane Doe".to_string(),
            masked_card_number: "**** **** **** 1234".to_string(),
            expiry_date: "06/28".to_string(),
        },
    ]
}
