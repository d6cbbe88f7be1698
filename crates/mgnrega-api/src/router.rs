use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Ingestion
        .route("/api/etl", post(handlers::trigger_etl))

        // Reference data
        .route("/api/districts", get(handlers::list_districts))
        .route("/api/map/districts", get(handlers::map_districts))
        .route("/api/geolocation", get(handlers::locate_district))

        // Dashboards
        .route("/api/dashboard/district", get(handlers::district_dashboard))
        .route("/api/dashboard/state", get(handlers::state_dashboard))

        .with_state(state)
}
