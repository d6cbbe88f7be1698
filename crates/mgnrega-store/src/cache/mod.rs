//! Response cache adapters
//!
//! `MemoryCache` lives inside one process. `RedisCache` is shared, so an
//! ingestion run in one process clears entries served by every other.

mod memory;
mod redis;

pub use memory::MemoryCache;
pub use redis::RedisCache;

use std::sync::Arc;

use crate::ports::Cache;

/// Environment variable naming the shared Redis cache
pub const REDIS_URL_ENV: &str = "REDIS_URL";

/// Key scheme and lifetimes for cached query responses
pub mod keys {
    use std::time::Duration;

    pub const DASHBOARD_TTL: Duration = Duration::from_secs(60 * 60);
    pub const DISTRICTS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
    pub const MAP_TTL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Patterns cleared after every ingestion run
    pub const INGESTION_INVALIDATES: [&str; 2] = ["dashboard:*", "map:*"];

    pub fn district_dashboard(district_code: &str, year: Option<&str>, months: usize) -> String {
        format!(
            "dashboard:district:{}:{}:{}",
            district_code,
            year.unwrap_or("all"),
            months
        )
    }

    pub fn state_dashboard(state_code: &str, year: Option<&str>) -> String {
        format!("dashboard:state:{}:{}", state_code, year.unwrap_or("all"))
    }

    pub fn districts(state_code: Option<&str>) -> String {
        format!("districts:{}", state_code.unwrap_or("all"))
    }

    pub fn map_districts(state_code: Option<&str>) -> String {
        format!("map:districts:{}", state_code.unwrap_or("all"))
    }
}

/// Shared Redis cache when a URL is given and reachable, else an in-process cache.
///
/// Returns the adapter and its name. Connection failures are logged, never fatal.
pub async fn connect(redis_url: Option<&str>) -> (Arc<dyn Cache>, &'static str) {
    if let Some(url) = redis_url.map(str::trim).filter(|u| !u.is_empty()) {
        match RedisCache::new(url).await {
            Ok(cache) => return (Arc::new(cache), "redis"),
            Err(e) => tracing::warn!(error = %e, "Redis unavailable, using in-process cache"),
        }
    }
    (Arc::new(MemoryCache::default()), "memory")
}

/// Same as [`connect`], reading `REDIS_URL`
pub async fn from_env() -> (Arc<dyn Cache>, &'static str) {
    connect(std::env::var(REDIS_URL_ENV).ok().as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme() {
        assert_eq!(keys::district_dashboard("1701", Some("2023-24"), 6), "dashboard:district:1701:2023-24:6");
        assert_eq!(keys::state_dashboard("17", None), "dashboard:state:17:all");
        assert_eq!(keys::districts(None), "districts:all");
        assert_eq!(keys::map_districts(Some("17")), "map:districts:17");
    }

    #[tokio::test]
    async fn test_connect_without_url_is_in_process() {
        let (_, name) = connect(None).await;
        assert_eq!(name, "memory");
        let (_, name) = connect(Some("  ")).await;
        assert_eq!(name, "memory");
    }

    #[tokio::test]
    async fn test_connect_falls_back_when_redis_is_unreachable() {
        let (cache, name) = connect(Some("redis://127.0.0.1:1/0")).await;
        assert_eq!(name, "memory");
        cache.set("k", serde_json::json!(1), keys::DASHBOARD_TTL).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
    }
}
