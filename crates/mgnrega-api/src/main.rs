use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use mgnrega_api::{create_router, scheduler, ApiConfig, AppState};
use mgnrega_core::config::AppConfig;
use mgnrega_ingest::{DataGovClient, IngestionPipeline};
use mgnrega_store::cache;
use mgnrega_store::memory::MemoryStore;
use mgnrega_store::ports::{DistrictStore, RecordStore, RunLease};
use mgnrega_store::postgres::{PostgresConfig, PostgresStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (
    Arc<dyn RecordStore>,
    Arc<dyn DistrictStore>,
    Arc<dyn RunLease>,
    &'static str,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mgnrega_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();
    let app_config = AppConfig::from_env().context("Invalid application configuration")?;

    tracing::info!(
        port = api_config.port,
        default_state = %app_config.default_state_code,
        scheduler = api_config.scheduler_enabled,
        "Starting MGNREGA API server"
    );

    let (records, districts, lease, storage) = init_storage(&api_config).await?;
    let (cache, cache_backend) = cache::from_env().await;
    tracing::info!(backend = cache_backend, "Response cache ready");

    let mut state = AppState::new(
        records.clone(),
        districts.clone(),
        cache.clone(),
        app_config.default_state_code.clone(),
    )
    .with_etl_api_key(api_config.etl_api_key.clone())
    .with_storage_name(storage);

    match app_config.require_upstream() {
        Ok(()) => {
            let client = DataGovClient::new(&app_config.data_gov)
                .context("Failed to build upstream client")?;
            let pipeline = Arc::new(
                IngestionPipeline::new(Arc::new(client), records, districts, &app_config)
                    .with_cache(cache)
                    .with_lease(lease),
            );
            if api_config.scheduler_enabled {
                scheduler::spawn(pipeline.clone());
            }
            state = state.with_ingestion(pipeline);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Upstream not configured; ETL trigger and scheduler disabled");
        }
    }

    let origin = api_config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", api_config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api_config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// PostgreSQL when DATABASE_URL is set, in-memory otherwise
async fn init_storage(config: &ApiConfig) -> anyhow::Result<Stores> {
    match &config.database_url {
        Some(database_url) => {
            tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
            let pg_config =
                PostgresConfig::from_database_url(database_url).context("Invalid DATABASE_URL")?;
            let store = PostgresStore::with_migrations(pg_config).await.context(
                "Failed to connect to PostgreSQL. Ensure it is running and DATABASE_URL points at an existing database",
            )?;
            tracing::info!("Connected to PostgreSQL");
            let store = Arc::new(store);
            Ok((store.clone(), store.clone(), store, "postgres"))
        }
        None => {
            tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
            let store = Arc::new(MemoryStore::new());
            Ok((store.clone(), store.clone(), store, "memory"))
        }
    }
}
