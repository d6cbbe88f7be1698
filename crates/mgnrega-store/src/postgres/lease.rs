use async_trait::async_trait;
use mgnrega_core::error::{MgnregaError, Result};
use std::time::Duration;

use super::{db_error, PostgresStore};
use crate::ports::RunLease;

#[async_trait]
impl RunLease for PostgresStore {
    /// Single-statement compare-and-set: the upsert only overwrites an
    /// expired lease or one the caller already holds.
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let ttl_ms = i64::try_from(ttl.as_millis())
            .map_err(|_| MgnregaError::Storage("lease ttl out of range".to_string()))?;

        let acquired: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO ingestion_leases (name, holder, acquired_at, expires_at)
            VALUES ($1, $2, NOW(), NOW() + ($3 * INTERVAL '1 millisecond'))
            ON CONFLICT (name) DO UPDATE
            SET holder = EXCLUDED.holder,
                acquired_at = EXCLUDED.acquired_at,
                expires_at = EXCLUDED.expires_at
            WHERE ingestion_leases.expires_at <= NOW()
               OR ingestion_leases.holder = EXCLUDED.holder
            RETURNING holder
            "#,
        )
        .bind(name)
        .bind(holder)
        .bind(ttl_ms as f64)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to acquire lease"))?;

        Ok(acquired.is_some())
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        sqlx::query("DELETE FROM ingestion_leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to release lease"))?;
        Ok(())
    }

    async fn is_held(&self, name: &str) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ingestion_leases WHERE name = $1 AND expires_at > NOW())",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check lease"))
    }
}
