use mgnrega_core::models::{Coordinates, District, PerformanceCategory, Trends};
use mgnrega_ingest::IngestionSummary;
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub storage: &'static str,
}

impl HealthResponse {
    pub fn ok(storage: &'static str) -> Self {
        Self {
            status: "ok",
            service: "mgnrega-api",
            storage,
        }
    }
}

/// ETL trigger response
#[derive(Debug, Serialize)]
pub struct EtlResponse {
    pub success: bool,
    pub message: String,
    pub result: IngestionSummary,
}

impl EtlResponse {
    pub fn completed(result: IngestionSummary) -> Self {
        let message = if result.aborted {
            "ETL stopped after repeated upstream failures".to_string()
        } else {
            "ETL completed successfully".to_string()
        };
        Self {
            success: true,
            message,
            result,
        }
    }
}

/// District identity as embedded in dashboard payloads
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRef {
    pub code: String,
    pub name: String,
    pub state_code: String,
    pub state_name: String,
}

impl From<&District> for DistrictRef {
    fn from(district: &District) -> Self {
        Self {
            code: district.district_code.clone(),
            name: district.district_name.clone(),
            state_code: district.state_code.clone(),
            state_name: district.state_name.clone(),
        }
    }
}

/// Returned with status 200 when the entity exists but nothing was ingested for it
#[derive(Debug, Serialize)]
pub struct NoDataResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<DistrictRef>,
}

impl NoDataResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: "No data available",
            message: message.into(),
            district: None,
        }
    }

    pub fn for_district(district: &District) -> Self {
        Self {
            district: Some(DistrictRef::from(district)),
            ..Self::new(format!(
                "No MGNREGA data found for district \"{}\". Please run ETL to fetch data.",
                district.district_name
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Warning,
    Info,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: &'static str,
    pub severity: AlertSeverity,
}

/// Latest period of a district with its aggregated totals. Money is in currency units.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestDistrictMetrics {
    pub district_code: String,
    pub state_code: String,
    pub financial_year: String,
    pub month: u8,
    pub year: i32,
    pub persons_worked: i64,
    pub households_worked: i64,
    pub workdays_generated: f64,
    pub workdays_per_person: f64,
    pub total_expenditure: f64,
    pub wage_expenditure: f64,
    pub material_expenditure: f64,
    pub works_completed: i64,
    pub works_in_progress: i64,
    pub works_sanctioned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persons_demanded: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_wage_rate: Option<f64>,
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub average_workdays_per_person: f64,
    pub total_works_completed: i64,
    pub vs_state_average: f64,
    pub performance_category: PerformanceCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictMonth {
    pub financial_year: String,
    pub month: u8,
    pub year: i32,
    pub persons_worked: i64,
    pub households_worked: i64,
    pub workdays_generated: f64,
    pub workdays_per_person: f64,
    pub total_expenditure: f64,
    pub works_completed: i64,
}

/// Per-district state average for the latest period
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateAverage {
    pub workdays_generated: f64,
    pub average_workdays_per_person: f64,
    pub total_expenditure: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDashboardResponse {
    pub district: DistrictRef,
    pub latest: LatestDistrictMetrics,
    pub monthly_data: Vec<DistrictMonth>,
    pub trends: Trends,
    pub state_average: Option<StateAverage>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct StateRef {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummaryView {
    pub financial_year: String,
    pub month: u8,
    pub year: i32,
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub average_workdays_per_person: f64,
    pub total_expenditure: f64,
    pub average_expenditure_per_workday: f64,
    pub district_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMonth {
    pub financial_year: String,
    pub month: u8,
    pub year: i32,
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub total_expenditure: f64,
    pub total_works_completed: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDistrict {
    pub district_code: String,
    pub district_name: String,
    pub total_workdays_generated: f64,
    pub persons_worked: i64,
    pub total_expenditure: f64,
    pub performance_category: PerformanceCategory,
    pub vs_state_average: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDashboardResponse {
    pub state: StateRef,
    pub summary: Option<StateSummaryView>,
    pub monthly_data: Vec<StateMonth>,
    pub top_districts: Vec<TopDistrict>,
    pub total_districts: usize,
}

/// Either a computed dashboard or the "known but empty" answer
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Dashboard<T> {
    Ready(Box<T>),
    NoData(NoDataResponse),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictListResponse {
    pub districts: Vec<District>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDistrict {
    pub district_code: String,
    pub district_name: String,
    pub state_code: String,
    pub state_name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Serialize)]
pub struct MapDistrictsResponse {
    pub districts: Vec<MapDistrict>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedDistrict {
    pub district_code: String,
    pub district_name: String,
    pub state_code: String,
    pub state_name: String,
}

#[derive(Debug, Serialize)]
pub struct GeolocationResponse {
    pub district: LocatedDistrict,
    /// Kilometers, two decimals
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
