use axum::{
    extract::{Query, State},
    Json,
};
use mgnrega_core::geo::nearest_district;
use mgnrega_core::models::Coordinates;
use std::sync::Arc;

use crate::dto::{GeolocationQuery, GeolocationResponse, LocatedDistrict};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/geolocation
pub async fn locate_district(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeolocationQuery>,
) -> Result<Json<GeolocationResponse>, ApiError> {
    // Zero doubles as "missing"; no Indian district sits on either axis.
    let (Some(lat), Some(lng)) = (
        query.lat.filter(|v| *v != 0.0 && v.is_finite()),
        query.lng.filter(|v| *v != 0.0 && v.is_finite()),
    ) else {
        return Err(ApiError::bad_request("Valid lat and lng are required"));
    };

    let districts = state.districts.list_districts(None).await?;
    let nearest = nearest_district(&districts, Coordinates { lat, lng }).ok_or_else(|| {
        ApiError::not_found("No districts found in database")
            .with_details("Please run ETL to populate district data first.")
    })?;

    let district = nearest.district;
    Ok(Json(GeolocationResponse {
        district: LocatedDistrict {
            district_code: district.district_code,
            district_name: district.district_name,
            state_code: district.state_code,
            state_name: district.state_name,
        },
        distance: nearest.distance_km,
        note: nearest.note,
    }))
}
