//! Nearest-district lookup
//!
//! Only point-to-point great-circle distance is supported; there is no
//! reverse geocoding.

use geo::{Distance, Haversine, Point};
use serde::Serialize;

use crate::models::{Coordinates, District};

/// Result of a nearest-district lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestDistrict {
    pub district: District,
    /// Great-circle distance in kilometers, rounded to two decimals
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Great-circle distance between two coordinates in kilometers
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let p1 = Point::new(a.lng, a.lat);
    let p2 = Point::new(b.lng, b.lat);
    Haversine.distance(p1, p2) / 1000.0
}

/// Find the district closest to `origin`.
///
/// Districts without coordinates are ignored. If none of them has coordinates
/// the first district is returned without a distance and with an explanatory
/// note. Returns `None` only when `districts` is empty.
pub fn nearest_district(districts: &[District], origin: Coordinates) -> Option<NearestDistrict> {
    let nearest = districts
        .iter()
        .filter_map(|d| d.coordinates.map(|c| (d, distance_km(origin, c))))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    if let Some((district, distance)) = nearest {
        return Some(NearestDistrict {
            district: district.clone(),
            distance_km: Some((distance * 100.0).round() / 100.0),
            note: None,
        });
    }

    let first = districts.first()?;
    tracing::warn!("No districts with coordinates found, falling back to first district");
    Some(NearestDistrict {
        district: first.clone(),
        distance_km: None,
        note: Some(
            "District coordinates not available. Add coordinates to districts for accurate geolocation."
                .to_string(),
        ),
    })
}
