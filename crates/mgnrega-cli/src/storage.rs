use crate::cli::StorageBackend;
use anyhow::{Context, Result};
use mgnrega_store::memory::MemoryStore;
use mgnrega_store::ports::{DistrictStore, RecordStore, RunLease};
use mgnrega_store::postgres::{PostgresConfig, PostgresStore};
use std::sync::Arc;

/// Parse database URL to extract connection details for error messages
fn parse_database_url(url: &str) -> (String, String, String) {
    let authority = url.split('@').nth(1).and_then(|s| s.split('/').next());

    let host = authority
        .and_then(|s| s.split(':').next())
        .unwrap_or("localhost")
        .to_string();

    let port = authority
        .and_then(|s| s.split(':').nth(1))
        .unwrap_or("5432")
        .to_string();

    let database = url
        .split('/')
        .next_back()
        .and_then(|s| s.split('?').next())
        .unwrap_or("mgnrega")
        .to_string();

    (host, port, database)
}

pub struct Storage {
    pub records: Arc<dyn RecordStore>,
    pub districts: Arc<dyn DistrictStore>,
    pub lease: Arc<dyn RunLease>,
    pub backend: StorageBackend,
}

impl Storage {
    pub async fn new(backend: StorageBackend) -> Result<Self> {
        match backend {
            StorageBackend::Memory => Ok(Self::new_memory()),
            StorageBackend::Postgres => Self::new_postgres().await,
        }
    }

    fn new_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            records: store.clone(),
            districts: store.clone(),
            lease: store,
            backend: StorageBackend::Memory,
        }
    }

    async fn new_postgres() -> Result<Self> {
        let store = Arc::new(connect_postgres(true).await?);
        Ok(Self {
            records: store.clone(),
            districts: store.clone(),
            lease: store,
            backend: StorageBackend::Postgres,
        })
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self.backend, StorageBackend::Memory)
    }
}

/// Connect to PostgreSQL from DATABASE_URL, optionally applying migrations
pub async fn connect_postgres(migrate: bool) -> Result<PostgresStore> {
    let config = PostgresConfig::from_env().context(
        "Failed to load PostgreSQL configuration. Set DATABASE_URL environment variable.",
    )?;

    let connected = if migrate {
        PostgresStore::with_migrations(config.clone()).await
    } else {
        PostgresStore::new(config.clone()).await
    };

    connected.map_err(|e| {
        let (host, port, database) = parse_database_url(&config.database_url);
        anyhow::anyhow!(
            "Failed to connect to PostgreSQL\n\n\
                Connection details:\n\
                  Host: {}\n\
                  Port: {}\n\
                  Database: {}\n\n\
                Remediation:\n\
                  1. Ensure PostgreSQL is running\n\
                  2. Check DATABASE_URL environment variable\n\
                  3. Verify credentials and database exists\n\n\
                Error: {}",
            host,
            port,
            database,
            e
        )
    })
}
