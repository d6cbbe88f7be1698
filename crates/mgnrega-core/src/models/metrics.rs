use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::record::CanonicalRecord;
use crate::calendar;

/// Raw sums over a set of records, as returned by the storage layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSums {
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub total_expenditure: f64,
    pub total_works_completed: i64,
    pub total_works_in_progress: i64,
    pub total_works_sanctioned: i64,
    pub record_count: u64,
    pub district_count: u64,
}

impl MetricSums {
    /// Sum a set of records; distinct districts are counted by code
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CanonicalRecord>) -> Self {
        let mut sums = Self::default();
        let mut districts = HashSet::new();
        for record in records {
            sums.total_persons_worked += record.persons_worked;
            sums.total_households_worked += record.households_worked;
            sums.total_workdays_generated += record.workdays_generated;
            sums.total_expenditure += record.total_expenditure;
            sums.total_works_completed += record.works_completed;
            sums.total_works_in_progress += record.works_in_progress;
            sums.total_works_sanctioned += record.works_sanctioned;
            sums.record_count += 1;
            districts.insert(record.district_code.as_str());
        }
        sums.district_count = districts.len() as u64;
        sums
    }
}

/// Sums plus the derived ratio fields, recomputed on every query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub average_workdays_per_person: f64,
    pub total_expenditure: f64,
    pub average_expenditure_per_workday: f64,
    pub total_works_completed: i64,
    pub total_works_in_progress: i64,
    pub total_works_sanctioned: i64,
    pub record_count: u64,
    pub district_count: u64,
}

impl From<MetricSums> for AggregatedMetrics {
    fn from(sums: MetricSums) -> Self {
        let average_workdays_per_person = if sums.total_persons_worked > 0 {
            sums.total_workdays_generated / sums.total_persons_worked as f64
        } else {
            0.0
        };
        let average_expenditure_per_workday = if sums.total_workdays_generated > 0.0 {
            sums.total_expenditure / sums.total_workdays_generated
        } else {
            0.0
        };

        Self {
            total_persons_worked: sums.total_persons_worked,
            total_households_worked: sums.total_households_worked,
            total_workdays_generated: sums.total_workdays_generated,
            average_workdays_per_person,
            total_expenditure: sums.total_expenditure,
            average_expenditure_per_workday,
            total_works_completed: sums.total_works_completed,
            total_works_in_progress: sums.total_works_in_progress,
            total_works_sanctioned: sums.total_works_sanctioned,
            record_count: sums.record_count,
            district_count: sums.district_count,
        }
    }
}

/// Totals of one (financial year, month) period across a state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    pub financial_year: String,
    pub financial_year_start: i32,
    pub month: u8,
    /// Calendar year of the period
    pub year: i32,
    pub total_persons_worked: i64,
    pub total_households_worked: i64,
    pub total_workdays_generated: f64,
    pub total_expenditure: f64,
    pub total_works_completed: i64,
}

impl PeriodTotals {
    pub fn empty(financial_year: impl Into<String>, financial_year_start: i32, month: u8) -> Self {
        Self {
            financial_year: financial_year.into(),
            financial_year_start,
            month,
            year: calendar::calendar_year_from_start(financial_year_start, month),
            total_persons_worked: 0,
            total_households_worked: 0,
            total_workdays_generated: 0.0,
            total_expenditure: 0.0,
            total_works_completed: 0,
        }
    }

    pub fn add(&mut self, record: &CanonicalRecord) {
        self.total_persons_worked += record.persons_worked;
        self.total_households_worked += record.households_worked;
        self.total_workdays_generated += record.workdays_generated;
        self.total_expenditure += record.total_expenditure;
        self.total_works_completed += record.works_completed;
    }
}

/// Per-district totals for a single period, used for ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictTotals {
    pub district_code: String,
    pub workdays_generated: f64,
    pub persons_worked: i64,
    pub total_expenditure: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_guard_zero_denominators() {
        let metrics = AggregatedMetrics::from(MetricSums::default());
        assert_eq!(metrics.average_workdays_per_person, 0.0);
        assert_eq!(metrics.average_expenditure_per_workday, 0.0);
    }

    #[test]
    fn test_ratios_from_sums() {
        let sums = MetricSums {
            total_persons_worked: 200,
            total_workdays_generated: 1000.0,
            total_expenditure: 50.0,
            record_count: 2,
            district_count: 1,
            ..MetricSums::default()
        };
        let metrics = AggregatedMetrics::from(sums);
        assert_eq!(metrics.average_workdays_per_person, 5.0);
        assert_eq!(metrics.average_expenditure_per_workday, 0.05);
    }

    #[test]
    fn test_period_totals_carry_calendar_year() {
        assert_eq!(PeriodTotals::empty("2023-24", 2023, 1).year, 2024);
        assert_eq!(PeriodTotals::empty("2023-24", 2023, 10).year, 2023);
    }
}
