//! In-process cache backed by moka
//!
//! Entries carry their own TTL. Invalidation takes a glob pattern but only
//! honours a trailing `*`, which is all the key scheme needs.

use async_trait::async_trait;
use mgnrega_core::error::Result;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::ports::Cache;

#[derive(Clone)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache shared by the API handlers and the ingestion pipeline
#[derive(Clone)]
pub struct MemoryCache {
    cache: MokaCache<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.cache.insert(key.to_string(), CacheEntry { value, ttl }).await;
        Ok(())
    }

    async fn invalidate(&self, pattern: &str) -> Result<u64> {
        let prefix = pattern.trim_end_matches('*');
        let exact = prefix.len() == pattern.len();

        let doomed: Vec<String> = self
            .cache
            .iter()
            .filter(|(k, _)| if exact { k.as_str() == prefix } else { k.starts_with(prefix) })
            .map(|(k, _)| (*k).clone())
            .collect();

        for key in &doomed {
            self.cache.invalidate(key).await;
        }

        tracing::debug!(pattern, removed = doomed.len(), "Cache invalidated");
        Ok(doomed.len() as u64)
    }
}
