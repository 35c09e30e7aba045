pub mod app;
pub mod error;
pub mod inventory;
pub mod order;
pub mod payment;
pub mod quotation;

pub use app::{Application, BootstrapError};
pub use error::{StoreError, StoreResult};
pub use inventory::{HttpInventoryApi, InventoryApi, InventoryApiError, InventoryStore};
pub use order::OrderStore;
pub use payment::PaymentStore;
pub use quotation::QuotationStore;
