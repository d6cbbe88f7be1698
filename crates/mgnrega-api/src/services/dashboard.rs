use mgnrega_analytics::{calculate_trends, performance_category, StateSummary};
use mgnrega_core::calendar::{calendar_year, crores_to_amount};
use mgnrega_core::models::{CanonicalRecord, PerformanceCategory, RecordFilter};

use crate::dto::{
    Alert, AlertSeverity, AlertType, Dashboard, DistrictDashboardResponse, DistrictMonth,
    DistrictRef, LatestDistrictMetrics, NoDataResponse, StateAverage, StateDashboardResponse,
    StateMonth, StateRef, StateSummaryView, TopDistrict,
};
use crate::error::ApiError;
use crate::state::AppState;

/// Periods shown in the state dashboard history
pub const STATE_HISTORY_MONTHS: usize = 12;

/// Districts ranked in the state dashboard
pub const TOP_DISTRICTS_LIMIT: usize = 20;

/// Workdays below which a district month is flagged as low
const LOW_WORKDAYS: f64 = 1000.0;

/// Build the dashboard of one district.
///
/// An unknown district is an error; a known district with no records is a
/// [`Dashboard::NoData`] answer.
pub async fn district_dashboard(
    state: &AppState,
    district_code: &str,
    financial_year: Option<&str>,
    months: usize,
) -> Result<Dashboard<DistrictDashboardResponse>, ApiError> {
    let Some(district) = state.districts.get_district(district_code).await? else {
        return Err(ApiError::not_found("District not found").with_details(format!(
            "District with code \"{}\" not found in database. Please ensure ETL has run and populated district data.",
            district_code
        )));
    };

    let Some(latest) = state.engine.latest(district_code, financial_year).await? else {
        return Ok(Dashboard::NoData(NoDataResponse::for_district(&district)));
    };

    let history = state.engine.trend(district_code, months).await?;
    let ordered: Vec<CanonicalRecord> = history.iter().map(|d| d.record.clone()).collect();
    let trends = calculate_trends(&ordered);

    let aggregated = state
        .engine
        .aggregate_district(district_code, financial_year)
        .await?;

    let state_average = state
        .engine
        .state_summary(
            &district.state_code,
            Some(latest.record.financial_year.as_str()),
            Some(latest.record.month),
        )
        .await?
        .map(|summary| per_district_average(&summary));

    let vs_state_average = match &state_average {
        Some(avg) if avg.workdays_generated > 0.0 => {
            (latest.record.workdays_generated - avg.workdays_generated) / avg.workdays_generated
                * 100.0
        }
        _ => 0.0,
    };
    let category = performance_category(vs_state_average);
    let alerts = generate_alerts(latest.record.workdays_generated, vs_state_average);

    let record = &latest.record;
    let totals = aggregated.as_ref();
    let latest_metrics = LatestDistrictMetrics {
        district_code: record.district_code.clone(),
        state_code: record.state_code.clone(),
        financial_year: record.financial_year.clone(),
        month: record.month,
        year: latest.year,
        persons_worked: record.persons_worked,
        households_worked: record.households_worked,
        workdays_generated: record.workdays_generated,
        workdays_per_person: record.workdays_per_person,
        total_expenditure: crores_to_amount(record.total_expenditure),
        wage_expenditure: crores_to_amount(record.wage_expenditure),
        material_expenditure: crores_to_amount(record.material_expenditure),
        works_completed: record.works_completed,
        works_in_progress: record.works_in_progress,
        works_sanctioned: record.works_sanctioned,
        persons_demanded: record.persons_demanded,
        avg_wage_rate: record.avg_wage_rate,
        total_persons_worked: nonzero_or(
            totals.map(|a| a.total_persons_worked),
            record.persons_worked,
        ),
        total_households_worked: nonzero_or(
            totals.map(|a| a.total_households_worked),
            record.households_worked,
        ),
        total_workdays_generated: nonzero_or(
            totals.map(|a| a.total_workdays_generated),
            record.workdays_generated,
        ),
        average_workdays_per_person: nonzero_or(
            totals.map(|a| a.average_workdays_per_person),
            record.workdays_per_person,
        ),
        total_works_completed: nonzero_or(
            totals.map(|a| a.total_works_completed),
            record.works_completed,
        ),
        vs_state_average,
        performance_category: category,
    };

    let monthly_data = history
        .into_iter()
        .map(|dated| {
            let r = dated.record;
            let workdays_per_person = if r.workdays_per_person != 0.0 {
                r.workdays_per_person
            } else if r.persons_worked > 0 {
                r.workdays_generated / r.persons_worked as f64
            } else {
                0.0
            };
            DistrictMonth {
                financial_year: r.financial_year,
                month: r.month,
                year: dated.year,
                persons_worked: r.persons_worked,
                households_worked: r.households_worked,
                workdays_generated: r.workdays_generated,
                workdays_per_person,
                total_expenditure: crores_to_amount(r.total_expenditure),
                works_completed: r.works_completed,
            }
        })
        .collect();

    Ok(Dashboard::Ready(Box::new(DistrictDashboardResponse {
        district: DistrictRef::from(&district),
        latest: latest_metrics,
        monthly_data,
        trends,
        state_average: state_average.map(|avg| StateAverage {
            total_expenditure: crores_to_amount(avg.total_expenditure),
            ..avg
        }),
        alerts,
    })))
}

/// Build the dashboard of one state for its latest reported period
pub async fn state_dashboard(
    state: &AppState,
    state_code: &str,
    financial_year: Option<&str>,
) -> Result<Dashboard<StateDashboardResponse>, ApiError> {
    let filter = RecordFilter::state(state_code).financial_year(financial_year);
    let Some(latest) = state.records.latest_record(&filter).await? else {
        return Ok(Dashboard::NoData(NoDataResponse::new(format!(
            "No records found for state {}. Run ETL to ingest data first.",
            state_code
        ))));
    };

    let districts = state.districts.list_districts(Some(state_code)).await?;

    let period = RecordFilter::state(state_code)
        .financial_year(Some(latest.financial_year.as_str()))
        .month(Some(latest.month));
    let summary = state.engine.aggregate(&period).await?;

    let monthly = state
        .engine
        .state_monthly_aggregates(state_code, financial_year, STATE_HISTORY_MONTHS)
        .await?;
    let top = state
        .engine
        .top_districts(
            state_code,
            &latest.financial_year,
            latest.month,
            TOP_DISTRICTS_LIMIT,
        )
        .await?;

    let district_count = [
        summary.as_ref().map_or(0, |s| s.district_count as usize),
        districts.len(),
        top.len(),
    ]
    .into_iter()
    .find(|n| *n > 0)
    .unwrap_or(1);

    let average_workdays = summary
        .as_ref()
        .map_or(0.0, |s| s.total_workdays_generated / district_count as f64);

    let top_districts = top
        .into_iter()
        .map(|totals| {
            let vs_state_average = if average_workdays > 0.0 {
                (totals.workdays_generated - average_workdays) / average_workdays * 100.0
            } else {
                0.0
            };
            let district_name = districts
                .iter()
                .find(|d| d.district_code == totals.district_code)
                .map(|d| d.district_name.clone())
                .unwrap_or_else(|| totals.district_code.clone());
            TopDistrict {
                district_name,
                district_code: totals.district_code,
                total_workdays_generated: totals.workdays_generated,
                persons_worked: totals.persons_worked,
                total_expenditure: crores_to_amount(totals.total_expenditure),
                performance_category: performance_category(vs_state_average),
                vs_state_average,
            }
        })
        .collect();

    let summary = summary.map(|s| StateSummaryView {
        financial_year: latest.financial_year.clone(),
        month: latest.month,
        year: calendar_year(&latest.financial_year, latest.month),
        total_persons_worked: s.total_persons_worked,
        total_households_worked: s.total_households_worked,
        total_workdays_generated: s.total_workdays_generated,
        average_workdays_per_person: s.average_workdays_per_person,
        total_expenditure: crores_to_amount(s.total_expenditure),
        average_expenditure_per_workday: s.average_expenditure_per_workday,
        district_count: district_count as u64,
    });

    let monthly_data = monthly
        .into_iter()
        .map(|p| StateMonth {
            financial_year: p.financial_year,
            month: p.month,
            year: p.year,
            total_persons_worked: p.total_persons_worked,
            total_households_worked: p.total_households_worked,
            total_workdays_generated: p.total_workdays_generated,
            total_expenditure: crores_to_amount(p.total_expenditure),
            total_works_completed: p.total_works_completed,
        })
        .collect();

    Ok(Dashboard::Ready(Box::new(StateDashboardResponse {
        state: StateRef {
            code: state_code.to_string(),
            name: districts
                .first()
                .map(|d| d.state_name.clone())
                .unwrap_or_else(|| state_code.to_string()),
        },
        summary,
        monthly_data,
        top_districts,
        total_districts: districts.len(),
    })))
}

/// Alerts for a district's latest period
pub fn generate_alerts(workdays_generated: f64, vs_state_average: f64) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if vs_state_average < -10.0 {
        alerts.push(Alert {
            alert_type: AlertType::Warning,
            message: "This district is performing below the state average.",
            severity: if vs_state_average < -20.0 {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            },
        });
    }

    if workdays_generated < LOW_WORKDAYS {
        alerts.push(Alert {
            alert_type: AlertType::Info,
            message: "Workdays generated is relatively low this month.",
            severity: AlertSeverity::Medium,
        });
    }

    if performance_category(vs_state_average) == PerformanceCategory::Poor {
        alerts.push(Alert {
            alert_type: AlertType::Critical,
            message: "District performance needs immediate attention.",
            severity: AlertSeverity::High,
        });
    }

    alerts
}

// Expenditure stays in crore here; callers convert at the payload boundary.
fn per_district_average(summary: &StateSummary) -> StateAverage {
    let districts = summary.district_count.max(1) as f64;
    StateAverage {
        workdays_generated: summary.workdays_per_district(),
        average_workdays_per_person: summary.average_workdays_per_person,
        total_expenditure: summary.total_expenditure / districts,
    }
}

fn nonzero_or<T: PartialEq + Default>(value: Option<T>, fallback: T) -> T {
    value.filter(|v| *v != T::default()).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_alerts_for_average_district() {
        assert!(generate_alerts(5000.0, 0.0).is_empty());
    }

    #[test]
    fn test_below_average_warning_severity() {
        let medium = generate_alerts(5000.0, -15.0);
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].alert_type, AlertType::Warning);
        assert_eq!(medium[0].severity, AlertSeverity::Medium);

        let high = generate_alerts(5000.0, -25.0);
        assert_eq!(high[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_poor_district_gets_critical_alert() {
        let alerts = generate_alerts(500.0, -30.0);
        let types: Vec<_> = alerts.iter().map(|a| a.alert_type).collect();
        assert_eq!(
            types,
            vec![AlertType::Warning, AlertType::Info, AlertType::Critical]
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        assert!(generate_alerts(1000.0, -10.0).is_empty());
    }

    #[test]
    fn test_nonzero_or_falls_back_on_zero() {
        assert_eq!(nonzero_or(Some(0i64), 7), 7);
        assert_eq!(nonzero_or(Some(3i64), 7), 3);
        assert_eq!(nonzero_or(None, 2.5), 2.5);
    }

    #[test]
    fn test_per_district_average() {
        let summary = StateSummary {
            total_workdays_generated: 3000.0,
            total_persons_worked: 300,
            total_expenditure: 6.0,
            average_workdays_per_person: 10.0,
            district_count: 3,
        };
        let avg = per_district_average(&summary);
        assert_eq!(avg.workdays_generated, 1000.0);
        assert_eq!(avg.total_expenditure, 2.0);
    }
}
