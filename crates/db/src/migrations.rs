use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    tracing::debug!(
        event_name = "db.migrations.applied",
        known = MIGRATOR.iter().count(),
        "schema migrations are up to date"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_pending;
    use crate::{connect_with_settings, migrations::MIGRATOR};

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &["snapshot_entry"];

    #[tokio::test]
    async fn migrations_create_managed_tables_and_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run is a no-op");

        for name in MANAGED_SCHEMA_OBJECTS {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE name = ?")
                    .bind(name)
                    .fetch_one(&pool)
                    .await
                    .expect("schema lookup");
            assert_eq!(count, 1, "expected schema object `{name}`");
        }
        assert!(MIGRATOR.iter().count() >= 1);
    }
}
