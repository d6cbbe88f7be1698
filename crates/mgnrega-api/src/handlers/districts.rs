use axum::{
    extract::{Query, State},
    Json,
};
use mgnrega_store::cache::keys;
use serde_json::Value;
use std::sync::Arc;

use crate::dto::{DistrictListResponse, StateQuery};
use crate::error::ApiError;
use crate::services::{cache_lookup, cache_store};
use crate::state::AppState;

/// GET /api/districts
///
/// Empty listings are never served from or written to the cache, so a
/// listing requested before the first ingestion does not stick for a day.
pub async fn list_districts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StateQuery>,
) -> Result<Json<Value>, ApiError> {
    let state_code = query
        .state_code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.default_state_code.clone());

    let key = keys::districts(Some(state_code.as_str()));
    if let Some(hit) = cache_lookup(state.cache.as_ref(), &key).await {
        let populated = hit
            .get("districts")
            .and_then(Value::as_array)
            .is_some_and(|d| !d.is_empty());
        if populated {
            return Ok(Json(hit));
        }
        if let Err(e) = state.cache.invalidate(&key).await {
            tracing::warn!(error = %e, key = %key, "Failed to drop empty district listing");
        }
    }

    let districts = state.districts.list_districts(Some(state_code.as_str())).await?;
    let count = districts.len();

    let message = if count == 0 {
        tracing::warn!(state_code = %state_code, "No districts found; run ETL to populate them");
        Some("No districts found. Run ETL to populate districts.".to_string())
    } else {
        None
    };

    let response = DistrictListResponse {
        districts,
        count,
        message,
    };

    if count > 0 {
        cache_store(state.cache.as_ref(), &key, &response, keys::DISTRICTS_TTL).await;
    }

    serde_json::to_value(&response)
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to serialize response").with_details(e.to_string()))
}
