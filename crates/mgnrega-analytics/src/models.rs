use mgnrega_core::models::{CanonicalRecord, MetricSums};
use serde::{Deserialize, Serialize};

/// A record together with the calendar year of its period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub year: i32,
}

impl From<CanonicalRecord> for DatedRecord {
    fn from(record: CanonicalRecord) -> Self {
        let year = record.calendar_year();
        Self { record, year }
    }
}

/// State-wide totals with the number of districts that reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub total_workdays_generated: f64,
    pub total_persons_worked: i64,
    pub total_expenditure: f64,
    pub average_workdays_per_person: f64,
    pub district_count: u64,
}

impl StateSummary {
    /// Average workdays generated per reporting district
    pub fn workdays_per_district(&self) -> f64 {
        if self.district_count > 0 {
            self.total_workdays_generated / self.district_count as f64
        } else {
            0.0
        }
    }
}

impl From<&MetricSums> for StateSummary {
    fn from(sums: &MetricSums) -> Self {
        let average_workdays_per_person = if sums.total_persons_worked > 0 {
            sums.total_workdays_generated / sums.total_persons_worked as f64
        } else {
            0.0
        };
        Self {
            total_workdays_generated: sums.total_workdays_generated,
            total_persons_worked: sums.total_persons_worked,
            total_expenditure: sums.total_expenditure,
            average_workdays_per_person,
            district_count: sums.district_count,
        }
    }
}
