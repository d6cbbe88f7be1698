use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::calendar;

/// Composite identity of one ingested period-record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub district_code: String,
    pub financial_year: String,
    pub month: u8,
}

/// One district's statistics for one month, normalized from the upstream feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    /// District identifier (part of the composite key)
    pub district_code: String,

    pub state_code: String,

    /// Financial year label such as "2023-24" (part of the composite key)
    pub financial_year: String,

    /// First calendar year of the financial year, used for chronological ordering
    pub financial_year_start: i32,

    /// Month 1-12 (part of the composite key)
    pub month: u8,

    pub persons_worked: i64,
    pub households_worked: i64,

    /// Person-days generated
    pub workdays_generated: f64,
    pub workdays_per_person: f64,

    /// Expenditure fields are held in crore
    pub total_expenditure: f64,
    pub wage_expenditure: f64,
    pub material_expenditure: f64,

    pub works_completed: i64,
    pub works_in_progress: i64,
    pub works_sanctioned: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons_demanded: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_wage_rate: Option<f64>,
}

impl CanonicalRecord {
    /// Composite key used as the upsert match criterion
    pub fn key(&self) -> RecordKey {
        RecordKey {
            district_code: self.district_code.clone(),
            financial_year: self.financial_year.clone(),
            month: self.month,
        }
    }

    /// Human-facing calendar year of this period
    pub fn calendar_year(&self) -> i32 {
        calendar::calendar_year_from_start(self.financial_year_start, self.month)
    }

    /// Chronological position of the period this record covers
    pub fn period(&self) -> (i32, u8) {
        (self.financial_year_start, self.month)
    }

    /// Ordering that puts the most recent period first
    pub fn latest_first(a: &Self, b: &Self) -> Ordering {
        b.period().cmp(&a.period())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fy: &str, start: i32, month: u8) -> CanonicalRecord {
        CanonicalRecord {
            district_code: "1701".to_string(),
            state_code: "17".to_string(),
            financial_year: fy.to_string(),
            financial_year_start: start,
            month,
            persons_worked: 0,
            households_worked: 0,
            workdays_generated: 0.0,
            workdays_per_person: 0.0,
            total_expenditure: 0.0,
            wage_expenditure: 0.0,
            material_expenditure: 0.0,
            works_completed: 0,
            works_in_progress: 0,
            works_sanctioned: 0,
            persons_demanded: None,
            avg_wage_rate: None,
        }
    }

    #[test]
    fn test_latest_first_orders_by_year_then_month() {
        let mut records = vec![
            sample("2022-23", 2022, 12),
            sample("2023-24", 2023, 1),
            sample("2023-24", 2023, 11),
        ];
        records.sort_by(CanonicalRecord::latest_first);

        let periods: Vec<_> = records.iter().map(|r| r.period()).collect();
        assert_eq!(periods, vec![(2023, 11), (2023, 1), (2022, 12)]);
    }

    #[test]
    fn test_calendar_year_of_record() {
        assert_eq!(sample("2023-24", 2023, 2).calendar_year(), 2024);
        assert_eq!(sample("2023-24", 2023, 5).calendar_year(), 2023);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample("2023-24", 2023, 5)).unwrap();
        assert_eq!(json["districtCode"], "1701");
        assert_eq!(json["financialYearStart"], 2023);
        assert!(json.get("personsDemanded").is_none());
    }
}
