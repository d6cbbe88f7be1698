use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mgnrega_api::{create_router, AppState};
use mgnrega_core::config::{LayeredConfig, PipelineConfig};
use mgnrega_core::error::{MgnregaError, Result};
use mgnrega_core::models::{CanonicalRecord, District};
use mgnrega_ingest::{IngestionPipeline, UpstreamPage, UpstreamQuery, UpstreamSource};
use mgnrega_store::cache::{keys, MemoryCache};
use mgnrega_store::memory::MemoryStore;
use mgnrega_store::ports::{Cache, DistrictStore, RecordStore};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Upstream that serves one fixed page and then runs dry
struct OnePageSource {
    page: Mutex<Option<UpstreamPage>>,
}

#[async_trait]
impl UpstreamSource for OnePageSource {
    async fn fetch_page(&self, _: &UpstreamQuery, _: usize, _: usize) -> Result<UpstreamPage> {
        Ok(self.page.lock().unwrap().take().unwrap_or_default())
    }
}

/// Cache whose backend is unreachable
struct DownCache;

#[async_trait]
impl Cache for DownCache {
    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        Err(MgnregaError::Cache("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<()> {
        Err(MgnregaError::Cache("connection refused".to_string()))
    }

    async fn invalidate(&self, _pattern: &str) -> Result<u64> {
        Err(MgnregaError::Cache("connection refused".to_string()))
    }
}

struct Harness {
    store: MemoryStore,
    cache: Arc<MemoryCache>,
    router: Router,
}

fn harness(configure: impl FnOnce(AppState, &MemoryStore, Arc<MemoryCache>) -> AppState) -> Harness {
    let store = MemoryStore::new();
    let cache = Arc::new(MemoryCache::default());
    let shared = Arc::new(store.clone());
    let state = AppState::new(shared.clone(), shared, cache.clone(), "MP");
    let state = configure(state, &store, cache.clone());
    Harness {
        store,
        cache,
        router: create_router(Arc::new(state)),
    }
}

fn plain() -> Harness {
    harness(|state, _, _| state)
}

fn with_pipeline(etl_key: Option<&str>) -> Harness {
    let raw = json!({
        "district_code": "1701",
        "district_name": "BHOPAL",
        "state_code": "MP",
        "state_name": "MADHYA PRADESH",
        "fin_year": "2023-24",
        "month": "Jun",
        "Persondays_of_Central_Liability_so_far": "1200",
        "Total_Individuals_Worked": "100",
        "Total_Households_Worked": "60",
        "Total_Exp": "2.5",
    });
    let Value::Object(raw) = raw else { unreachable!() };
    let source = Arc::new(OnePageSource {
        page: Mutex::new(Some(UpstreamPage {
            records: vec![raw],
            total: Some(1),
        })),
    });
    let key = etl_key.map(str::to_string);

    harness(move |state, store, cache| {
        let mut config = LayeredConfig::with_defaults().build().unwrap();
        config.pipeline = PipelineConfig::without_delays();
        let shared = Arc::new(store.clone());
        let pipeline =
            IngestionPipeline::new(source, shared.clone(), shared, &config).with_cache(cache);
        state
            .with_ingestion(Arc::new(pipeline))
            .with_etl_api_key(key)
    })
}

fn record(district: &str, fy_start: i32, month: u8, workdays: f64) -> CanonicalRecord {
    CanonicalRecord {
        district_code: district.to_string(),
        state_code: "MP".to_string(),
        financial_year: format!("{}-{:02}", fy_start, (fy_start + 1) % 100),
        financial_year_start: fy_start,
        month,
        persons_worked: 100,
        households_worked: 50,
        workdays_generated: workdays,
        workdays_per_person: workdays / 100.0,
        total_expenditure: 2.0,
        wage_expenditure: 1.5,
        material_expenditure: 0.5,
        works_completed: 10,
        works_in_progress: 4,
        works_sanctioned: 20,
        persons_demanded: None,
        avg_wage_rate: None,
    }
}

async fn seed_state(store: &MemoryStore) {
    store
        .upsert_district(&District::new("1701", "BHOPAL", "MP", "MADHYA PRADESH").with_coordinates(23.26, 77.41))
        .await
        .unwrap();
    store
        .upsert_district(&District::new("1702", "INDORE", "MP", "MADHYA PRADESH").with_coordinates(22.72, 75.86))
        .await
        .unwrap();
    store
        .upsert_district(&District::new("1703", "SEONI", "MP", "MADHYA PRADESH"))
        .await
        .unwrap();
    store
        .upsert_records(&[
            record("1701", 2023, 5, 4000.0),
            record("1701", 2023, 6, 2000.0),
            record("1702", 2023, 6, 6000.0),
        ])
        .await
        .unwrap();
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_etl(body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/api/etl").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_reports_storage() {
    let h = plain();
    let (status, body) = get(&h.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_district_dashboard_requires_code() {
    let h = plain();
    let (status, body) = get(&h.router, "/api/dashboard/district").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "districtCode is required");
}

#[tokio::test]
async fn test_unknown_district_is_not_found() {
    let h = plain();
    let (status, body) = get(&h.router, "/api/dashboard/district?districtCode=9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "District not found");
}

#[tokio::test]
async fn test_known_district_without_data_is_ok_with_message() {
    let h = plain();
    h.store
        .upsert_district(&District::new("1703", "SEONI", "MP", "MADHYA PRADESH"))
        .await
        .unwrap();

    let (status, body) = get(&h.router, "/api/dashboard/district?districtCode=1703").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No data available");
    assert_eq!(body["district"]["name"], "SEONI");
    assert!(h
        .cache
        .get(&keys::district_dashboard("1703", None, 12))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_district_dashboard_compares_with_state_average() {
    let h = plain();
    seed_state(&h.store).await;

    let (status, body) = get(&h.router, "/api/dashboard/district?districtCode=1701").await;
    assert_eq!(status, StatusCode::OK);

    let latest = &body["latest"];
    assert_eq!(latest["financialYear"], "2023-24");
    assert_eq!(latest["month"], 6);
    assert_eq!(latest["year"], 2023);
    // Expenditure leaves the API in currency units, not crore
    assert_eq!(latest["totalExpenditure"], 20_000_000.0);
    assert_eq!(latest["totalWorkdaysGenerated"], 6000.0);

    // State average for Jun 2023 is (2000 + 6000) / 2 = 4000 per district
    assert_eq!(body["stateAverage"]["workdaysGenerated"], 4000.0);
    assert_eq!(latest["vsStateAverage"], -50.0);
    assert_eq!(latest["performanceCategory"], "poor");

    assert_eq!(body["trends"]["workdaysTrend"], "down");
    assert_eq!(body["monthlyData"].as_array().unwrap().len(), 2);
    assert_eq!(body["monthlyData"][0]["month"], 6);

    let alert_types: Vec<_> = body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(alert_types, vec!["warning", "critical"]);
}

#[tokio::test]
async fn test_district_dashboard_is_cached() {
    let h = plain();
    seed_state(&h.store).await;

    let (_, first) = get(&h.router, "/api/dashboard/district?districtCode=1701&months=1").await;
    let cached = h
        .cache
        .get(&keys::district_dashboard("1701", None, 1))
        .await
        .unwrap();
    assert_eq!(cached, Some(first.clone()));

    h.store
        .upsert_records(&[record("1701", 2023, 7, 9000.0)])
        .await
        .unwrap();
    let (_, second) = get(&h.router, "/api/dashboard/district?districtCode=1701&months=1").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_state_dashboard_ranks_districts() {
    let h = plain();
    seed_state(&h.store).await;

    let (status, body) = get(&h.router, "/api/dashboard/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["code"], "MP");
    assert_eq!(body["state"]["name"], "MADHYA PRADESH");
    assert_eq!(body["summary"]["month"], 6);
    assert_eq!(body["summary"]["districtCount"], 2);
    assert_eq!(body["summary"]["totalWorkdaysGenerated"], 8000.0);
    assert_eq!(body["totalDistricts"], 3);

    let top = body["topDistricts"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["districtName"], "INDORE");
    assert_eq!(top[0]["vsStateAverage"], 50.0);
    assert_eq!(top[0]["performanceCategory"], "excellent");
    assert_eq!(top[1]["districtCode"], "1701");

    assert_eq!(body["monthlyData"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_state_dashboard_without_records() {
    let h = plain();
    let (status, body) = get(&h.router, "/api/dashboard/state?stateCode=UP").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "No data available");
}

#[tokio::test]
async fn test_empty_district_listing_is_not_cached() {
    let h = plain();
    let (status, body) = get(&h.router, "/api/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["message"].is_string());
    assert!(h.cache.get(&keys::districts(Some("MP"))).await.unwrap().is_none());

    seed_state(&h.store).await;
    let (_, body) = get(&h.router, "/api/districts").await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["districts"][0]["districtName"], "BHOPAL");
    assert!(body.get("message").is_none());
    assert!(h.cache.get(&keys::districts(Some("MP"))).await.unwrap().is_some());
}

#[tokio::test]
async fn test_map_lists_only_located_districts() {
    let h = plain();
    seed_state(&h.store).await;

    let (status, body) = get(&h.router, "/api/map/districts").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<_> = body["districts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["districtCode"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["1701", "1702"]);
    assert_eq!(body["districts"][0]["coordinates"]["lat"], 23.26);
}

#[tokio::test]
async fn test_geolocation_validation_and_lookup() {
    let h = plain();

    let (status, _) = get(&h.router, "/api/geolocation?lat=23.2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&h.router, "/api/geolocation?lat=23.2&lng=77.4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    seed_state(&h.store).await;
    let (status, body) = get(&h.router, "/api/geolocation?lat=22.7&lng=75.9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["district"]["districtCode"], "1702");
    assert!(body["distance"].as_f64().unwrap() < 10.0);
    assert!(body.get("note").is_none());
}

#[tokio::test]
async fn test_etl_unavailable_without_upstream() {
    let h = plain();
    let (status, _) = send(&h.router, post_etl("{}", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_etl_requires_bearer_token_when_configured() {
    let h = with_pipeline(Some("secret"));

    let (status, body) = send(&h.router, post_etl("{}", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(&h.router, post_etl("{}", Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_etl_rejects_out_of_range_month() {
    let h = with_pipeline(None);
    let (status, _) = send(&h.router, post_etl(r#"{"month": 13}"#, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_etl_runs_pipeline_and_invalidates_dashboards() {
    let h = with_pipeline(Some("secret"));
    h.cache
        .set("dashboard:state:MP:all", json!({"stale": true}), keys::DASHBOARD_TTL)
        .await
        .unwrap();

    let (status, body) = send(
        &h.router,
        post_etl(r#"{"stateCode": "MP", "financialYear": "2023-24"}"#, Some("secret")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "ETL completed successfully");
    assert_eq!(body["result"]["processed"], 1);
    assert_eq!(body["result"]["districts"], 1);
    assert_eq!(body["result"]["errors"], 0);

    assert_eq!(h.store.record_len().unwrap(), 1);
    assert!(h.cache.get("dashboard:state:MP:all").await.unwrap().is_none());

    let (status, body) = get(&h.router, "/api/dashboard/district?districtCode=1701").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["district"]["name"], "BHOPAL");
}

#[tokio::test]
async fn test_unreachable_cache_falls_through_to_store() {
    let store = MemoryStore::new();
    seed_state(&store).await;
    let shared = Arc::new(store.clone());
    let cache: Arc<dyn Cache> = Arc::new(DownCache);

    let source = Arc::new(OnePageSource {
        page: Mutex::new(Some(UpstreamPage::default())),
    });
    let mut config = LayeredConfig::with_defaults().build().unwrap();
    config.pipeline = PipelineConfig::without_delays();
    let pipeline = IngestionPipeline::new(source, shared.clone(), shared.clone(), &config)
        .with_cache(cache.clone());
    let state = AppState::new(shared.clone(), shared, cache, "MP").with_ingestion(Arc::new(pipeline));
    let router = create_router(Arc::new(state));

    let (status, body) = get(&router, "/api/dashboard/district?districtCode=1701").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latest"]["totalWorkdaysGenerated"], 6000.0);

    let (status, body) = get(&router, "/api/dashboard/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["districtCount"], 2);

    let (status, body) = get(&router, "/api/districts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (status, body) = send(&router, post_etl("{}", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}
