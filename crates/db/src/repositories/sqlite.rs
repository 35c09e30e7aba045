use super::{RepositoryError, SnapshotRepository};
use crate::DbPool;

pub struct SqliteSnapshotRepository {
    pool: DbPool,
}

impl SqliteSnapshotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl SnapshotRepository for SqliteSnapshotRepository {
    async fn load(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM snapshot_entry WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: String) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO snapshot_entry (key, value, updated_at) \
             VALUES (?, ?, strftime('%Y-%m-%dT%H:%M:%fZ', 'now')) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM snapshot_entry WHERE key = ?").bind(key).execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSnapshotRepository;
    use crate::repositories::SnapshotRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqliteSnapshotRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqliteSnapshotRepository::new(pool)
    }

    #[tokio::test]
    async fn sqlite_repo_upserts_and_removes() {
        let repo = repository().await;

        assert_eq!(repo.load("starbags_orders").await.expect("load"), None);
        repo.save("starbags_orders", "[]".to_owned()).await.expect("insert");
        repo.save("starbags_orders", "[1]".to_owned()).await.expect("update");
        assert_eq!(repo.load("starbags_orders").await.expect("load"), Some("[1]".to_owned()));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM snapshot_entry")
            .fetch_one(repo.pool())
            .await
            .expect("count");
        assert_eq!(rows, 1);

        repo.remove("starbags_orders").await.expect("remove");
        assert_eq!(repo.load("starbags_orders").await.expect("load"), None);
    }
}
