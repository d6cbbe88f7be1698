//! Response assembly over the aggregation engine, plus best-effort caching

pub mod dashboard;

use mgnrega_store::ports::Cache;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Look up a cached response. Cache failures read as a miss.
pub async fn cache_lookup(cache: &dyn Cache, key: &str) -> Option<Value> {
    match cache.get(key).await {
        Ok(hit) => hit,
        Err(e) => {
            tracing::warn!(error = %e, key, "Cache read failed");
            None
        }
    }
}

/// Serialize and store a response. Failures are logged and dropped.
pub async fn cache_store<T: Serialize>(cache: &dyn Cache, key: &str, response: &T, ttl: Duration) {
    let value = match serde_json::to_value(response) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, key, "Could not serialize response for cache");
            return;
        }
    };
    if let Err(e) = cache.set(key, value, ttl).await {
        tracing::warn!(error = %e, key, "Cache write failed");
    }
}
