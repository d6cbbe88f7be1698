use axum::{
    extract::{Query, State},
    Json,
};
use mgnrega_store::cache::keys;
use serde_json::Value;
use std::sync::Arc;

use crate::dto::{MapDistrict, MapDistrictsResponse, StateQuery};
use crate::error::ApiError;
use crate::services::{cache_lookup, cache_store};
use crate::state::AppState;

/// GET /api/map/districts
///
/// Only districts with coordinates are returned; no state means every state.
pub async fn map_districts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StateQuery>,
) -> Result<Json<Value>, ApiError> {
    let state_code = query.state_code.filter(|c| !c.trim().is_empty());

    let key = keys::map_districts(state_code.as_deref());
    if let Some(hit) = cache_lookup(state.cache.as_ref(), &key).await {
        return Ok(Json(hit));
    }

    let districts = state.districts.list_districts(state_code.as_deref()).await?;
    let response = MapDistrictsResponse {
        districts: districts
            .into_iter()
            .filter_map(|d| {
                let coordinates = d.coordinates?;
                Some(MapDistrict {
                    district_code: d.district_code,
                    district_name: d.district_name,
                    state_code: d.state_code,
                    state_name: d.state_name,
                    coordinates,
                })
            })
            .collect(),
    };

    cache_store(state.cache.as_ref(), &key, &response, keys::MAP_TTL).await;

    serde_json::to_value(&response)
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to serialize response").with_details(e.to_string()))
}
