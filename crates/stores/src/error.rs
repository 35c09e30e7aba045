use starbags_core::{ApplicationError, DomainError};
use starbags_db::RepositoryError;
use thiserror::Error;

use crate::inventory::InventoryApiError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Inventory(#[from] InventoryApiError),
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(error) => Self::Domain(error),
            StoreError::Repository(error) => Self::Persistence(error.to_string()),
            StoreError::Inventory(error) => Self::Network(error.to_string()),
        }
    }
}
