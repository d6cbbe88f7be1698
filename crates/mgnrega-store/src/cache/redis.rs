//! Shared cache backed by Redis (or a compatible server such as Valkey)
//!
//! Values are stored as JSON strings with a millisecond TTL. Pattern
//! invalidation walks the keyspace with SCAN, so it never blocks the server.

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use mgnrega_core::error::{MgnregaError, Result};
use serde_json::Value;
use std::time::Duration;

use crate::ports::Cache;

const SCAN_BATCH: u64 = 100;

/// Redis cache shared by every process that points at the same server
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    /// Connect and verify the server answers PING.
    ///
    /// Accepts `redis://[user:password@]host:port[/db]` and `rediss://` for TLS.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let sanitized = sanitize_redis_url(redis_url);

        let mut config = Config::from_url(redis_url);
        config.pool = Some(deadpool_redis::PoolConfig {
            max_size: 16,
            timeouts: deadpool_redis::Timeouts {
                wait: Some(Duration::from_secs(5)),
                create: Some(Duration::from_secs(5)),
                recycle: Some(Duration::from_secs(5)),
            },
            ..Default::default()
        });
        let pool = config.create_pool(Some(Runtime::Tokio1)).map_err(|e| {
            MgnregaError::Cache(format!("Failed to create Redis pool for {}: {}", sanitized, e))
        })?;

        let mut conn = pool.get().await.map_err(|e| {
            MgnregaError::Cache(format!("Failed to connect to Redis at {}: {}", sanitized, e))
        })?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| MgnregaError::Cache(format!("Redis PING failed for {}: {}", sanitized, e)))?;

        tracing::info!(url = %sanitized, "Redis cache connected");
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Connection> {
        self.pool.get().await.map_err(cache_error)
    }
}

fn cache_error(err: impl std::fmt::Display) -> MgnregaError {
    MgnregaError::Cache(err.to_string())
}

/// Mask the password in a Redis URL for logging
fn sanitize_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
        if let Some(colon_pos) = url.get(scheme_end..at_pos).and_then(|s| s.find(':')) {
            let abs_colon = scheme_end + colon_pos;
            return format!("{}***{}", &url[..=abs_colon], &url[at_pos..]);
        }
    }
    url.to_string()
}

/// TTL in whole milliseconds, never zero (zero would mean no expiry)
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(key).await.map_err(cache_error)?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(&value)?;
        let _: () = deadpool_redis::redis::cmd("PSETEX")
            .arg(key)
            .arg(ttl_millis(ttl))
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let mut removed = 0u64;
        let mut cursor: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(cache_error)?;

            if !keys.is_empty() {
                let deleted: u64 = deadpool_redis::redis::cmd("DEL")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(cache_error)?;
                removed += deleted;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!(pattern, removed, "Cache invalidated");
        Ok(removed)
    }
}
