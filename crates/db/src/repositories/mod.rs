use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::snapshot::{self, SnapshotError};

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySnapshotRepository;
pub use sqlite::SqliteSnapshotRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Key/value store holding one JSON blob per key. Every save replaces the whole blob.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    async fn save(&self, key: &str, value: String) -> Result<(), RepositoryError>;
    async fn remove(&self, key: &str) -> Result<(), RepositoryError>;
}

/// Reads a versioned collection; a missing key is an empty collection.
pub async fn load_collection<T>(
    repository: &dyn SnapshotRepository,
    key: &str,
) -> Result<Vec<T>, RepositoryError>
where
    T: DeserializeOwned,
{
    match repository.load(key).await? {
        Some(raw) => Ok(snapshot::decode(key, &raw)?),
        None => Ok(Vec::new()),
    }
}

pub async fn save_collection<T>(
    repository: &dyn SnapshotRepository,
    key: &str,
    records: &[T],
) -> Result<(), RepositoryError>
where
    T: Serialize + Sync,
{
    let raw = snapshot::encode(key, records)?;
    repository.save(key, raw).await
}
