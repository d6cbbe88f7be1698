use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in WGS 84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// District reference entity, keyed by `district_code`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub district_code: String,
    pub district_name: String,
    pub state_code: String,
    pub state_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl District {
    pub fn new(
        district_code: impl Into<String>,
        district_name: impl Into<String>,
        state_code: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        Self {
            district_code: district_code.into(),
            district_name: district_name.into(),
            state_code: state_code.into(),
            state_name: state_name.into(),
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates { lat, lng });
        self
    }
}
