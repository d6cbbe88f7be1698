use axum::{
    extract::{Query, State},
    Json,
};
use mgnrega_analytics::DEFAULT_TREND_WINDOW;
use mgnrega_store::cache::keys;
use serde_json::Value;
use std::sync::Arc;

use crate::dto::{Dashboard, DistrictDashboardQuery, StateDashboardQuery};
use crate::error::ApiError;
use crate::services::{cache_lookup, cache_store, dashboard};
use crate::state::AppState;

/// GET /api/dashboard/district
pub async fn district_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DistrictDashboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let district_code = query
        .district_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("districtCode is required"))?;
    let financial_year = query.financial_year.as_deref().filter(|fy| !fy.is_empty());
    let months = query.months.unwrap_or(DEFAULT_TREND_WINDOW);

    let key = keys::district_dashboard(district_code, financial_year, months);
    if let Some(hit) = cache_lookup(state.cache.as_ref(), &key).await {
        tracing::debug!(key = %key, "Dashboard cache hit");
        return Ok(Json(hit));
    }

    let dashboard =
        dashboard::district_dashboard(&state, district_code, financial_year, months).await?;
    if let Dashboard::Ready(response) = &dashboard {
        cache_store(state.cache.as_ref(), &key, response, keys::DASHBOARD_TTL).await;
    }

    to_json(&dashboard)
}

/// GET /api/dashboard/state
pub async fn state_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StateDashboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let state_code = query
        .state_code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| state.default_state_code.clone());
    let financial_year = query.financial_year.as_deref().filter(|fy| !fy.is_empty());

    let key = keys::state_dashboard(&state_code, financial_year);
    if let Some(hit) = cache_lookup(state.cache.as_ref(), &key).await {
        tracing::debug!(key = %key, "Dashboard cache hit");
        return Ok(Json(hit));
    }

    let dashboard = dashboard::state_dashboard(&state, &state_code, financial_year).await?;
    if let Dashboard::Ready(response) = &dashboard {
        cache_store(state.cache.as_ref(), &key, response, keys::DASHBOARD_TTL).await;
    }

    to_json(&dashboard)
}

fn to_json<T: serde::Serialize>(response: &T) -> Result<Json<Value>, ApiError> {
    serde_json::to_value(response)
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to serialize response").with_details(e.to_string()))
}
