use mgnrega_analytics::{calculate_trends, AggregationEngine};
use mgnrega_core::models::{CanonicalRecord, TrendDirection};
use mgnrega_store::memory::MemoryStore;
use mgnrega_store::ports::RecordStore;
use std::sync::Arc;

fn record(district: &str, fy: &str, start: i32, month: u8, workdays: f64) -> CanonicalRecord {
    CanonicalRecord {
        district_code: district.to_string(),
        state_code: "17".to_string(),
        financial_year: fy.to_string(),
        financial_year_start: start,
        month,
        persons_worked: 100,
        households_worked: 40,
        workdays_generated: workdays,
        workdays_per_person: workdays / 100.0,
        total_expenditure: workdays / 1000.0,
        wage_expenditure: 0.0,
        material_expenditure: 0.0,
        works_completed: 4,
        works_in_progress: 2,
        works_sanctioned: 6,
        persons_demanded: None,
        avg_wage_rate: None,
    }
}

async fn seeded_engine() -> AggregationEngine {
    let store = MemoryStore::new();
    store
        .upsert_records(&[
            record("1701", "2022-23", 2022, 3, 900.0),
            record("1701", "2023-24", 2023, 4, 1000.0),
            record("1701", "2023-24", 2023, 5, 1060.0),
            record("1702", "2023-24", 2023, 5, 3000.0),
            record("1703", "2023-24", 2023, 5, 1060.0),
        ])
        .await
        .unwrap();
    AggregationEngine::new(Arc::new(store))
}

#[tokio::test]
async fn test_aggregate_district_totals_and_ratios() {
    let engine = seeded_engine().await;

    let all = engine.aggregate_district("1701", None).await.unwrap().unwrap();
    assert_eq!(all.record_count, 3);
    assert_eq!(all.total_workdays_generated, 2960.0);
    assert_eq!(all.total_persons_worked, 300);
    assert!((all.average_workdays_per_person - 2960.0 / 300.0).abs() < 1e-9);

    let year = engine
        .aggregate_district("1701", Some("2023-24"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(year.record_count, 2);
}

#[tokio::test]
async fn test_aggregate_unknown_scope_is_none() {
    let engine = seeded_engine().await;
    assert!(engine.aggregate_district("9999", None).await.unwrap().is_none());
    assert!(engine.state_summary("27", None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_latest_carries_calendar_year() {
    let engine = seeded_engine().await;

    let latest = engine.latest("1701", None).await.unwrap().unwrap();
    assert_eq!(latest.record.month, 5);
    assert_eq!(latest.year, 2023);

    let older = engine.latest("1701", Some("2022-23")).await.unwrap().unwrap();
    assert_eq!(older.record.month, 3);
    assert_eq!(older.year, 2023);
}

#[tokio::test]
async fn test_trend_window_feeds_trend_calculation() {
    let engine = seeded_engine().await;

    let window = engine.trend("1701", 2).await.unwrap();
    assert_eq!(window.len(), 2);

    let records: Vec<CanonicalRecord> = window.into_iter().map(|d| d.record).collect();
    let trends = calculate_trends(&records);
    assert_eq!(trends.workdays_change, 6.0);
    assert_eq!(trends.workdays_trend, TrendDirection::Up);
}

#[tokio::test]
async fn test_state_summary_counts_districts() {
    let engine = seeded_engine().await;

    let summary = engine
        .state_summary("17", Some("2023-24"), Some(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.district_count, 3);
    assert_eq!(summary.total_workdays_generated, 5120.0);
    assert!((summary.workdays_per_district() - 5120.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_top_districts_ranked_with_code_tie_break() {
    let engine = seeded_engine().await;

    let top = engine.top_districts("17", "2023-24", 5, 10).await.unwrap();
    let codes: Vec<_> = top.iter().map(|t| t.district_code.as_str()).collect();
    assert_eq!(codes, vec!["1702", "1701", "1703"]);

    let top_one = engine.top_districts("17", "2023-24", 5, 1).await.unwrap();
    assert_eq!(top_one.len(), 1);
}

#[tokio::test]
async fn test_state_monthly_aggregates_latest_first() {
    let engine = seeded_engine().await;

    let months = engine.state_monthly_aggregates("17", None, 12).await.unwrap();
    let periods: Vec<_> = months
        .iter()
        .map(|p| (p.financial_year.as_str(), p.month, p.year))
        .collect();
    assert_eq!(
        periods,
        vec![("2023-24", 5, 2023), ("2023-24", 4, 2023), ("2022-23", 3, 2023)]
    );
    assert_eq!(months[0].total_workdays_generated, 5120.0);

    let limited = engine
        .state_monthly_aggregates("17", Some("2023-24"), 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}
