use async_trait::async_trait;
use mgnrega_core::error::Result;
use mgnrega_core::models::{
    CanonicalRecord, Coordinates, District, DistrictTotals, MetricSums, PeriodTotals,
    RecordFilter,
};
use serde_json::Value;
use std::time::Duration;

/// Port for the canonical monthly records
///
/// Every write is a full-document upsert keyed by
/// (district_code, financial_year, month), so repeated or concurrent writes of
/// the same key converge on the last one.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upsert a batch of records as one unordered bulk operation.
    ///
    /// Returns the number of records written.
    async fn upsert_records(&self, records: &[CanonicalRecord]) -> Result<u64>;

    /// Records matching the filter, most recent period first.
    ///
    /// Records of the same period are ordered by district code.
    async fn find_records(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<CanonicalRecord>>;

    /// Most recent record matching the filter
    async fn latest_record(&self, filter: &RecordFilter) -> Result<Option<CanonicalRecord>> {
        Ok(self.find_records(filter, Some(1)).await?.into_iter().next())
    }

    /// Sum the core metrics over matching records
    async fn sum_metrics(&self, filter: &RecordFilter) -> Result<MetricSums>;

    /// Totals grouped by (financial_year, financial_year_start, month), most recent first
    async fn period_totals(&self, filter: &RecordFilter, limit: usize)
        -> Result<Vec<PeriodTotals>>;

    /// Totals grouped by district, ordered by workdays descending then district code
    async fn district_totals(
        &self,
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<DistrictTotals>>;

    /// Number of matching records
    async fn count_records(&self, filter: &RecordFilter) -> Result<u64>;

    /// Distinct financial years present, most recent first
    async fn financial_years(&self) -> Result<Vec<String>>;

    /// Distinct district codes that have at least one record
    async fn districts_with_data(&self) -> Result<Vec<String>>;
}

/// Port for district reference data
#[async_trait]
pub trait DistrictStore: Send + Sync {
    /// Insert or refresh a district.
    ///
    /// Existing coordinates are kept when the incoming district has none.
    async fn upsert_district(&self, district: &District) -> Result<()>;

    /// Get a district by code
    async fn get_district(&self, district_code: &str) -> Result<Option<District>>;

    /// List districts ordered by name, optionally restricted to one state
    async fn list_districts(&self, state_code: Option<&str>) -> Result<Vec<District>>;

    /// Attach coordinates to a district; returns false if it does not exist
    async fn set_coordinates(&self, district_code: &str, coordinates: Coordinates)
        -> Result<bool>;
}

/// Port for the named lease that keeps scheduled ingestion runs from overlapping
#[async_trait]
pub trait RunLease: Send + Sync {
    /// Take the lease if it is free or expired. Returns false if someone else holds it.
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool>;

    /// Release the lease if `holder` still owns it
    async fn release(&self, name: &str, holder: &str) -> Result<()>;

    /// Whether an unexpired lease exists
    async fn is_held(&self, name: &str) -> Result<bool>;
}

/// Port for the best-effort response cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a cached value
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value for `ttl`
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Delete keys matching a glob-style pattern such as "dashboard:*".
    ///
    /// Returns the number of keys removed.
    async fn invalidate(&self, pattern: &str) -> Result<u64>;
}
