pub mod inventory;
pub mod order;
pub mod payment;
pub mod product;
pub mod quotation;
