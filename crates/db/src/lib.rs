pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod snapshot;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    InMemorySnapshotRepository, RepositoryError, SnapshotRepository, SqliteSnapshotRepository,
};
pub use snapshot::{keys, SnapshotError, CURRENT_SCHEMA_VERSION};
