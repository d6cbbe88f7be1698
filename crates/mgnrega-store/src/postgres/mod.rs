//! PostgreSQL storage adapter implementation

pub mod config;
pub mod districts;
pub mod lease;
pub mod migrations;
pub mod records;

pub use config::{ConfigError, MigrationConfig, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager, MigrationStatus};

use mgnrega_core::error::{MgnregaError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given configuration
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| MgnregaError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| MgnregaError::Storage(format!("Failed to connect to database: {}", e)))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| MgnregaError::Storage(format!("Connection test failed: {}", e)))?;

        tracing::info!(
            max_connections = config.pool.max_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { pool, config })
    }

    /// Create a new store and run migrations when the config asks for it
    pub async fn with_migrations(config: PostgresConfig) -> Result<Self> {
        let auto_run = config.migrations.auto_run;
        let store = Self::new(config).await?;
        if auto_run {
            store.run_migrations().await?;
        }
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| MgnregaError::Storage(format!("Migration failed: {}", e)))
    }

    /// Check migration status
    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>> {
        MigrationManager::new(self.pool.clone())
            .check_status()
            .await
            .map_err(|e| MgnregaError::Storage(format!("Failed to check migration status: {}", e)))
    }

    /// Check if there are pending migrations
    pub async fn has_pending_migrations(&self) -> Result<bool> {
        MigrationManager::new(self.pool.clone())
            .has_pending_migrations()
            .await
            .map_err(|e| {
                MgnregaError::Storage(format!("Failed to check pending migrations: {}", e))
            })
    }

    /// Get the current schema version
    pub async fn current_version(&self) -> Result<Option<i64>> {
        MigrationManager::new(self.pool.clone())
            .current_version()
            .await
            .map_err(|e| MgnregaError::Storage(format!("Failed to get current version: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MgnregaError::Storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

pub(crate) fn db_error(context: &str) -> impl Fn(sqlx::Error) -> MgnregaError + '_ {
    move |e| MgnregaError::Storage(format!("{}: {}", context, e))
}
