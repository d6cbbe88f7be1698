use serde::Deserialize;

/// Query parameters of the district dashboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDashboardQuery {
    pub district_code: Option<String>,
    pub financial_year: Option<String>,
    pub months: Option<usize>,
}

/// Query parameters of the state dashboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDashboardQuery {
    pub state_code: Option<String>,
    pub financial_year: Option<String>,
}

/// Optional state narrowing for district listings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateQuery {
    pub state_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeolocationQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// ETL trigger body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlRequest {
    pub state_code: Option<String>,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
}
