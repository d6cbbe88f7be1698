use std::env;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: Option<String>,
    /// Bearer token required by the ETL trigger when set
    pub etl_api_key: Option<String>,
    /// Run the calendar scheduler inside the server process
    pub scheduler_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: "http://localhost:3000".to_string(),
            database_url: None,
            etl_api_key: None,
            scheduler_enabled: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = non_empty("MGNREGA_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origin = non_empty("MGNREGA_CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let scheduler_enabled = non_empty("MGNREGA_SCHEDULER")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Self {
            port,
            cors_origin,
            database_url: non_empty("DATABASE_URL"),
            etl_api_key: non_empty("ETL_API_KEY"),
            scheduler_enabled,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if PostgreSQL storage is configured
    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
