use std::sync::Arc;

use starbags_core::config::AppConfig;
use starbags_core::{AuditSink, Catalog, NoopAuditSink};
use starbags_db::{
    connect_with_settings, migrations, DbPool, InMemorySnapshotRepository, SnapshotRepository,
    SqliteSnapshotRepository,
};
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::inventory::{HttpInventoryApi, InventoryApi, InventoryApiError, InventoryStore};
use crate::order::OrderStore;
use crate::payment::PaymentStore;
use crate::quotation::QuotationStore;

/// Store graph shared by every entry point. Clones share the same stores and pool.
#[derive(Clone)]
pub struct Application {
    pub config: AppConfig,
    pub db_pool: Option<DbPool>,
    pub catalog: Arc<Catalog>,
    pub orders: Arc<OrderStore>,
    pub quotations: Arc<QuotationStore>,
    pub payments: Arc<PaymentStore>,
    pub inventory: Arc<InventoryStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("inventory client could not be built: {0}")]
    InventoryClient(#[source] InventoryApiError),
    #[error("store hydration failed: {0}")]
    Hydration(#[source] StoreError),
}

impl Application {
    /// Connects storage, applies migrations and hydrates the stores. The inventory cache stays
    /// empty until [`InventoryStore::refresh`] is called.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, BootstrapError> {
        info!(
            event_name = "system.bootstrap.start",
            correlation_id = "bootstrap",
            "starting application bootstrap"
        );

        let db_pool = connect_with_settings(
            &config.storage.url,
            config.storage.max_connections,
            config.storage.timeout_secs,
        )
        .await
        .map_err(BootstrapError::DatabaseConnect)?;
        info!(
            event_name = "system.bootstrap.database_connected",
            correlation_id = "bootstrap",
            "database connection established"
        );

        migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
        info!(
            event_name = "system.bootstrap.migrations_applied",
            correlation_id = "bootstrap",
            "database migrations applied"
        );

        let api = HttpInventoryApi::from_config(&config.inventory)
            .map_err(BootstrapError::InventoryClient)?;
        let repository = Arc::new(SqliteSnapshotRepository::new(db_pool.clone()));

        let mut app = Self::assemble(config, repository, Arc::new(api), Arc::new(NoopAuditSink)).await?;
        app.db_pool = Some(db_pool);
        Ok(app)
    }

    /// Same graph over in-memory storage, for tests and dry runs.
    pub async fn in_memory(
        api: Arc<dyn InventoryApi>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, BootstrapError> {
        Self::assemble(
            AppConfig::default(),
            Arc::new(InMemorySnapshotRepository::default()),
            api,
            audit,
        )
        .await
    }

    async fn assemble(
        config: AppConfig,
        repository: Arc<dyn SnapshotRepository>,
        api: Arc<dyn InventoryApi>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, BootstrapError> {
        let catalog = Arc::new(Catalog::standard());
        let orders =
            Arc::new(OrderStore::hydrate(repository.clone()).await.map_err(BootstrapError::Hydration)?);
        let quotations = Arc::new(
            QuotationStore::hydrate(repository.clone(), orders.clone(), catalog.clone(), audit)
                .await
                .map_err(BootstrapError::Hydration)?,
        );
        let payments =
            Arc::new(PaymentStore::hydrate(repository).await.map_err(BootstrapError::Hydration)?);
        let inventory = Arc::new(InventoryStore::new(api, catalog.clone()));

        info!(
            event_name = "system.bootstrap.stores_ready",
            correlation_id = "bootstrap",
            "stores hydrated"
        );
        Ok(Self { config, db_pool: None, catalog, orders, quotations, payments, inventory })
    }

    /// Closes the storage pool; in-memory applications have nothing to release.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.db_pool {
            pool.close().await;
        }
    }
}
