use mgnrega_analytics::{DatedRecord, StateSummary};
use mgnrega_core::models::{AggregatedMetrics, District, DistrictTotals, Trends};
use mgnrega_ingest::IngestionSummary;
use serde::Serialize;

/// Output for etl command
#[derive(Debug, Serialize)]
pub struct EtlOutput {
    pub state_code: Option<String>,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
    /// False when an exclusive run found the lease held
    pub ran: bool,
    pub summary: Option<IngestionSummary>,
}

/// Output for check command
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub district_count: usize,
    pub districts_with_coordinates: usize,
    pub record_count: u64,
    pub latest: Option<LatestRecordInfo>,
    pub districts_with_data: usize,
    pub financial_years: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LatestRecordInfo {
    pub financial_year: String,
    pub month: u8,
    pub district_code: String,
    pub district_name: Option<String>,
    pub workdays_generated: f64,
}

/// Output for district command
#[derive(Debug, Serialize)]
pub struct DistrictOutput {
    pub district: District,
    pub totals: Option<AggregatedMetrics>,
    pub trends: Trends,
    pub history: Vec<DatedRecord>,
}

/// Output for state command
#[derive(Debug, Serialize)]
pub struct StateOutput {
    pub state_code: String,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
    pub summary: Option<StateSummary>,
    pub top_districts: Vec<DistrictTotals>,
}

/// Output for coordinates command
#[derive(Debug, Serialize)]
pub struct CoordinatesOutput {
    pub updated: usize,
    pub unmatched: Vec<String>,
}

/// Output for probe command
#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub endpoint: String,
    pub sample_records: usize,
    pub total: Option<u64>,
    pub estimated_pages: Option<u64>,
    pub estimated_minutes: Option<u64>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// Output for db status command
#[derive(Debug, Serialize)]
pub struct MigrationEntry {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}
