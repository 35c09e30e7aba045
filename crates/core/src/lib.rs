pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ids;
pub mod pricing;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink, NoopAuditSink};
pub use catalog::Catalog;
pub use domain::inventory::{InventoryItem, InventoryPatch, InventoryRecord, NewInventoryRecord};
pub use domain::order::{Order, OrderId, OrderItem, OrderSource, OrderStatus};
pub use domain::payment::{
    NewPayment, NewSavedMethod, Payment, PaymentFilter, PaymentId, PaymentMethod, PaymentPatch,
    PaymentStats, PaymentStatus, SavedMethodId, SavedMethodPatch, SavedPaymentMethod,
};
pub use domain::product::{Product, ProductId};
pub use domain::quotation::{
    Quotation, QuotationId, QuotationItem, QuotationItemInput, QuotationPatch, QuotationRequest,
    QuotationStats, QuotationStatus,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ids::IdSequence;
