use mgnrega_core::models::{CanonicalRecord, PerformanceCategory, TrendDirection, Trends};

/// Changes strictly beyond this many percent count as up or down
const TREND_THRESHOLD: f64 = 5.0;

/// Percent change from `previous` to `latest`; zero when `previous` is not positive
pub fn percent_change(latest: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (latest - previous) / previous * 100.0
    } else {
        0.0
    }
}

fn direction(change: f64) -> TrendDirection {
    if change > TREND_THRESHOLD {
        TrendDirection::Up
    } else if change < -TREND_THRESHOLD {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compare the latest period (index 0) with the previous one (index 1).
///
/// Records must already be ordered most recent first. Fewer than two records
/// yields all-stable with zero change.
pub fn calculate_trends(ordered: &[CanonicalRecord]) -> Trends {
    let [latest, previous, ..] = ordered else {
        return Trends::default();
    };

    let workdays = percent_change(latest.workdays_generated, previous.workdays_generated);
    let expenditure = percent_change(latest.total_expenditure, previous.total_expenditure);
    let works = percent_change(latest.works_completed as f64, previous.works_completed as f64);

    Trends {
        workdays_trend: direction(workdays),
        expenditure_trend: direction(expenditure),
        works_trend: direction(works),
        workdays_change: round2(workdays),
        expenditure_change: round2(expenditure),
        works_change: round2(works),
    }
}

/// Classify a district's percent difference from its state average.
///
/// Lower bounds are inclusive and checked from the top down.
pub fn performance_category(vs_state_average: f64) -> PerformanceCategory {
    if vs_state_average >= 20.0 {
        PerformanceCategory::Excellent
    } else if vs_state_average >= 10.0 {
        PerformanceCategory::Good
    } else if vs_state_average >= -10.0 {
        PerformanceCategory::Average
    } else if vs_state_average >= -20.0 {
        PerformanceCategory::BelowAverage
    } else {
        PerformanceCategory::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(workdays: f64, expenditure: f64, works: i64) -> CanonicalRecord {
        CanonicalRecord {
            district_code: "1701".to_string(),
            state_code: "17".to_string(),
            financial_year: "2023-24".to_string(),
            financial_year_start: 2023,
            month: 5,
            persons_worked: 0,
            households_worked: 0,
            workdays_generated: workdays,
            workdays_per_person: 0.0,
            total_expenditure: expenditure,
            wage_expenditure: 0.0,
            material_expenditure: 0.0,
            works_completed: works,
            works_in_progress: 0,
            works_sanctioned: 0,
            persons_demanded: None,
            avg_wage_rate: None,
        }
    }

    #[test]
    fn test_trend_up_at_six_percent() {
        let trends = calculate_trends(&[record(1060.0, 1.0, 1), record(1000.0, 1.0, 1)]);
        assert_eq!(trends.workdays_change, 6.0);
        assert_eq!(trends.workdays_trend, TrendDirection::Up);
    }

    #[test]
    fn test_trend_boundary_is_exclusive() {
        let trends = calculate_trends(&[record(950.0, 1050.0, 1), record(1000.0, 1000.0, 1)]);
        assert_eq!(trends.workdays_change, -5.0);
        assert_eq!(trends.workdays_trend, TrendDirection::Stable);
        assert_eq!(trends.expenditure_change, 5.0);
        assert_eq!(trends.expenditure_trend, TrendDirection::Stable);

        let trends = calculate_trends(&[record(1050.1, 949.9, 1), record(1000.0, 1000.0, 1)]);
        assert_eq!(trends.workdays_change, 5.01);
        assert_eq!(trends.workdays_trend, TrendDirection::Up);
        assert_eq!(trends.expenditure_change, -5.01);
        assert_eq!(trends.expenditure_trend, TrendDirection::Down);
    }

    #[test]
    fn test_zero_previous_yields_zero_change() {
        let trends = calculate_trends(&[record(500.0, 2.0, 3), record(0.0, 0.0, 0)]);
        assert_eq!(trends.workdays_change, 0.0);
        assert_eq!(trends.works_change, 0.0);
        assert_eq!(trends.works_trend, TrendDirection::Stable);
    }

    #[test]
    fn test_fewer_than_two_records_is_stable() {
        assert_eq!(calculate_trends(&[]), Trends::default());
        assert_eq!(calculate_trends(&[record(1.0, 1.0, 1)]), Trends::default());
    }

    #[test]
    fn test_only_first_two_records_matter() {
        let trends = calculate_trends(&[
            record(200.0, 1.0, 1),
            record(100.0, 1.0, 1),
            record(1.0, 1.0, 1),
        ]);
        assert_eq!(trends.workdays_change, 100.0);
    }

    #[test]
    fn test_performance_category_boundaries() {
        assert_eq!(performance_category(20.0), PerformanceCategory::Excellent);
        assert_eq!(performance_category(19.99), PerformanceCategory::Good);
        assert_eq!(performance_category(10.0), PerformanceCategory::Good);
        assert_eq!(performance_category(9.99), PerformanceCategory::Average);
        assert_eq!(performance_category(-10.0), PerformanceCategory::Average);
        assert_eq!(performance_category(-10.01), PerformanceCategory::BelowAverage);
        assert_eq!(performance_category(-20.0), PerformanceCategory::BelowAverage);
        assert_eq!(performance_category(-20.01), PerformanceCategory::Poor);
    }

    proptest! {
        #[test]
        fn prop_category_is_monotonic(a in -100.0f64..100.0, b in -100.0f64..100.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let rank = |c: PerformanceCategory| match c {
                PerformanceCategory::Poor => 0,
                PerformanceCategory::BelowAverage => 1,
                PerformanceCategory::Average => 2,
                PerformanceCategory::Good => 3,
                PerformanceCategory::Excellent => 4,
            };
            prop_assert!(rank(performance_category(low)) <= rank(performance_category(high)));
        }

        #[test]
        fn prop_direction_matches_sign_beyond_threshold(prev in 1.0f64..1e6, pct in -90.0f64..90.0) {
            let latest = prev * (1.0 + pct / 100.0);
            let trends = calculate_trends(&[record(latest, 0.0, 0), record(prev, 0.0, 0)]);
            if pct > 5.001 {
                prop_assert_eq!(trends.workdays_trend, TrendDirection::Up);
            } else if pct < -5.001 {
                prop_assert_eq!(trends.workdays_trend, TrendDirection::Down);
            } else if pct.abs() < 4.999 {
                prop_assert_eq!(trends.workdays_trend, TrendDirection::Stable);
            }
        }
    }
}
