use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse::ok(state.storage))
}
