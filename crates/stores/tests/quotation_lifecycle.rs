use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use starbags_core::{
    AuditOutcome, DomainError, InMemoryAuditSink, InventoryPatch, InventoryRecord,
    NewInventoryRecord, OrderSource, OrderStatus, ProductId, QuotationItemInput, QuotationPatch,
    QuotationRequest, QuotationStatus,
};
use starbags_stores::{Application, InventoryApi, InventoryApiError, StoreError};

struct OfflineInventory;

#[async_trait]
impl InventoryApi for OfflineInventory {
    async fn list(&self) -> Result<Vec<InventoryRecord>, InventoryApiError> {
        Ok(Vec::new())
    }

    async fn create(&self, _record: &NewInventoryRecord) -> Result<InventoryRecord, InventoryApiError> {
        unreachable!("inventory is not touched by quotation tests")
    }

    async fn update(
        &self,
        _inventory_id: i64,
        _patch: &InventoryPatch,
    ) -> Result<InventoryRecord, InventoryApiError> {
        unreachable!("inventory is not touched by quotation tests")
    }

    async fn delete(&self, _inventory_id: i64) -> Result<(), InventoryApiError> {
        unreachable!("inventory is not touched by quotation tests")
    }
}

async fn app() -> (Application, InMemoryAuditSink) {
    let sink = InMemoryAuditSink::default();
    let app = Application::in_memory(Arc::new(OfflineInventory), Arc::new(sink.clone()))
        .await
        .expect("in-memory application");
    (app, sink)
}

fn item(product_id: &str, quantity: u32, unit_price: i64, discount: i64) -> QuotationItemInput {
    QuotationItemInput {
        product_id: ProductId(product_id.to_owned()),
        quantity,
        unit_price: Some(Decimal::from(unit_price)),
        discount: Some(Decimal::from(discount)),
        ..QuotationItemInput::default()
    }
}

fn request(user_id: &str, items: Vec<QuotationItemInput>) -> QuotationRequest {
    QuotationRequest {
        company_name: "Acme Corp".to_owned(),
        contact_person: "Jane Doe".to_owned(),
        email: "jane@acme.test".to_owned(),
        user_id: user_id.to_owned(),
        items,
        ..QuotationRequest::default()
    }
}

#[tokio::test]
async fn creation_computes_subtotal_total_and_draft_status() {
    let (app, _sink) = app().await;

    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");

    assert_eq!(quotation.subtotal, Decimal::from(200));
    assert_eq!(quotation.total_amount, Decimal::from(180));
    assert_eq!(quotation.items[0].total, Decimal::from(180));
    assert_eq!(quotation.status, QuotationStatus::Draft);
}

#[tokio::test]
async fn totals_follow_every_item_edit() {
    let (app, _sink) = app().await;
    let quotation = app
        .quotations
        .create_quotation(request("u1", vec![item("1", 2, 100, 10), item("2", 1, 50, 0)]))
        .await
        .expect("create");
    assert_eq!(quotation.total_amount, Decimal::from(230));

    let updated = app
        .quotations
        .update_quotation(
            &quotation.id.0,
            QuotationPatch {
                items: Some(vec![item("1", 3, 100, 20), item("2", 4, 50, 50)]),
                ..QuotationPatch::default()
            },
        )
        .await
        .expect("update items");

    let expected_subtotal: Decimal =
        updated.items.iter().map(|line| Decimal::from(line.quantity) * line.unit_price).sum();
    let expected_total: Decimal = updated
        .items
        .iter()
        .map(|line| {
            Decimal::from(line.quantity) * line.unit_price * (Decimal::ONE - line.discount / Decimal::from(100))
        })
        .sum();
    assert_eq!(updated.subtotal, expected_subtotal);
    assert_eq!(updated.total_amount, expected_total);
    assert_eq!(updated.total_amount, Decimal::from(340));
}

#[tokio::test]
async fn approved_quotation_refuses_edits_without_changes() {
    let (app, sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");
    let approved = app
        .quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Approved, None)
        .await
        .expect("approve");

    let error = app
        .quotations
        .update_quotation(
            &quotation.id.0,
            QuotationPatch {
                company_name: Some("Changed".to_owned()),
                items: Some(vec![item("1", 99, 1, 0)]),
                ..QuotationPatch::default()
            },
        )
        .await
        .expect_err("approved is locked");

    assert!(matches!(error, StoreError::Domain(DomainError::Locked { .. })));
    let after = app.quotations.get_quotation(&quotation.id.0).await.expect("still there");
    assert_eq!(
        serde_json::to_string(&after).expect("encode"),
        serde_json::to_string(&approved).expect("encode")
    );
    assert_eq!(sink.events_of_type("quotation.updated")[0].outcome, AuditOutcome::Rejected);
}

#[tokio::test]
async fn draft_quotation_cannot_be_deleted() {
    let (app, _sink) = app().await;
    let draft =
        app.quotations.create_quotation(request("u1", vec![item("1", 1, 10, 0)])).await.expect("create");
    let before = app.quotations.list_quotations().await;

    let error = app.quotations.delete_quotation(&draft.id.0).await.expect_err("draft stays");

    assert!(matches!(error, StoreError::Domain(DomainError::InvalidTransition { .. })));
    assert_eq!(app.quotations.list_quotations().await, before);

    app.quotations
        .update_quotation_status(&draft.id.0, QuotationStatus::Rejected, Some("no budget"))
        .await
        .expect("reject");
    app.quotations.delete_quotation(&draft.id.0).await.expect("rejected can go");
    assert!(app.quotations.list_quotations().await.is_empty());
}

#[tokio::test]
async fn converting_an_approved_quotation_creates_one_processing_order() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");
    app.quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Approved, None)
        .await
        .expect("approve");

    let order_id = app.quotations.convert_to_order(&quotation.id.0).await.expect("convert");

    let orders = app.orders.list_orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].total, Decimal::from(180));
    assert_eq!(orders[0].status, OrderStatus::Processing);
    assert_eq!(orders[0].source, Some(OrderSource::Quotation));

    let converted = app.quotations.get_quotation(&quotation.id.0).await.expect("get");
    assert_eq!(converted.status, QuotationStatus::Converted);
    assert!(converted.converted_order_id.as_ref().is_some_and(|id| !id.0.is_empty()));
}

#[tokio::test]
async fn converting_a_draft_fails_without_a_phantom_order() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");

    let error = app.quotations.convert_to_order(&quotation.id.0).await.expect_err("draft");

    assert!(matches!(error, StoreError::Domain(DomainError::InvalidTransition { .. })));
    assert!(app.orders.list_orders().await.is_empty());
    assert_eq!(
        app.quotations.get_quotation(&quotation.id.0).await.expect("get").status,
        QuotationStatus::Draft
    );

    let error = app.quotations.convert_to_order("QT-999").await.expect_err("unknown");
    assert!(matches!(error, StoreError::Domain(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn converted_status_is_only_reachable_through_conversion() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 1, 10, 0)])).await.expect("create");
    app.quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Approved, None)
        .await
        .expect("approve");

    let error = app
        .quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Converted, None)
        .await
        .expect_err("converted needs an order");
    assert!(matches!(error, StoreError::Domain(DomainError::InvalidTransition { .. })));

    let error = app
        .quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Rejected, None)
        .await
        .expect_err("approved cannot be rejected");
    assert!(matches!(error, StoreError::Domain(DomainError::InvalidTransition { .. })));
}

#[tokio::test]
async fn quotations_by_user_keep_insertion_order() {
    let (app, _sink) = app().await;
    for user in ["u1", "u2", "u1", "u2", "u1"] {
        app.quotations.create_quotation(request(user, vec![item("1", 1, 10, 0)])).await.expect("create");
    }

    let mine = app.quotations.get_quotations_by_user("u1").await;

    assert!(mine.iter().all(|quotation| quotation.user_id == "u1"));
    let ids: Vec<_> = mine.into_iter().map(|quotation| quotation.id.0).collect();
    assert_eq!(ids, vec!["QT-001", "QT-003", "QT-005"]);
}

#[tokio::test]
async fn repeated_rejection_overwrites_reason() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 1, 10, 0)])).await.expect("create");

    for _ in 0..2 {
        let rejected = app
            .quotations
            .update_quotation_status(&quotation.id.0, QuotationStatus::Rejected, Some("out of stock"))
            .await
            .expect("reject is idempotent");
        assert_eq!(rejected.rejection_reason.as_deref(), Some("out of stock"));
    }
    assert_eq!(app.quotations.stats().await.rejected, 1);
}

#[tokio::test]
async fn refused_conversion_does_not_use_up_an_order_id() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");

    let error = app.quotations.convert_to_order(&quotation.id.0).await.expect_err("draft cannot convert");
    assert!(matches!(error, StoreError::Domain(DomainError::InvalidTransition { .. })));

    app.quotations
        .update_quotation_status(&quotation.id.0, QuotationStatus::Approved, None)
        .await
        .expect("approve");
    let order_id = app.quotations.convert_to_order(&quotation.id.0).await.expect("convert");
    assert_eq!(order_id.0, "ORD-001");
}

#[tokio::test]
async fn overflowing_totals_are_refused_without_touching_the_store() {
    let (app, _sink) = app().await;
    let quotation =
        app.quotations.create_quotation(request("u1", vec![item("1", 2, 100, 10)])).await.expect("create");
    let huge = QuotationItemInput {
        unit_price: Some(Decimal::from_i128_with_scale(10_i128.pow(25), 0)),
        ..item("1", 100_000, 0, 10)
    };

    let error = app
        .quotations
        .create_quotation(request("u1", vec![huge.clone()]))
        .await
        .expect_err("overflowing create");
    assert!(matches!(
        error,
        StoreError::Domain(DomainError::Validation(ref message)) if message.contains("exceeds representable amount")
    ));

    let error = app
        .quotations
        .update_quotation(
            &quotation.id.0,
            QuotationPatch { items: Some(vec![huge]), ..QuotationPatch::default() },
        )
        .await
        .expect_err("overflowing edit");
    assert!(matches!(error, StoreError::Domain(DomainError::Validation(_))));

    let stored = app.quotations.list_quotations().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].total_amount, Decimal::from(180));
}
