use mgnrega_core::error::Result;
use mgnrega_core::models::{AggregatedMetrics, DistrictTotals, PeriodTotals, RecordFilter};
use mgnrega_store::ports::RecordStore;
use std::sync::Arc;

use crate::models::{DatedRecord, StateSummary};

/// Default number of periods in a district trend window
pub const DEFAULT_TREND_WINDOW: usize = 12;

/// On-demand aggregation over the record store
///
/// Nothing is precomputed; every call reads the current records, so results
/// are always consistent with the last ingestion run.
#[derive(Clone)]
pub struct AggregationEngine {
    records: Arc<dyn RecordStore>,
}

impl AggregationEngine {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Totals and ratios over the filter, or `None` if nothing matches
    pub async fn aggregate(&self, filter: &RecordFilter) -> Result<Option<AggregatedMetrics>> {
        let sums = self.records.sum_metrics(filter).await?;
        if sums.record_count == 0 {
            tracing::debug!(?filter, "No records match filter");
            return Ok(None);
        }
        Ok(Some(AggregatedMetrics::from(sums)))
    }

    /// Totals for one district, optionally within a financial year
    pub async fn aggregate_district(
        &self,
        district_code: &str,
        financial_year: Option<&str>,
    ) -> Result<Option<AggregatedMetrics>> {
        self.aggregate(&RecordFilter::district(district_code).financial_year(financial_year))
            .await
    }

    /// Most recent record of a district
    pub async fn latest(
        &self,
        district_code: &str,
        financial_year: Option<&str>,
    ) -> Result<Option<DatedRecord>> {
        let filter = RecordFilter::district(district_code).financial_year(financial_year);
        Ok(self.records.latest_record(&filter).await?.map(DatedRecord::from))
    }

    /// The most recent `window` periods of a district, latest first
    pub async fn trend(&self, district_code: &str, window: usize) -> Result<Vec<DatedRecord>> {
        let records = self
            .records
            .find_records(&RecordFilter::district(district_code), Some(window))
            .await?;
        Ok(records.into_iter().map(DatedRecord::from).collect())
    }

    /// State-wide totals, optionally narrowed to a year and month
    pub async fn state_summary(
        &self,
        state_code: &str,
        financial_year: Option<&str>,
        month: Option<u8>,
    ) -> Result<Option<StateSummary>> {
        let filter = RecordFilter::state(state_code)
            .financial_year(financial_year)
            .month(month);
        let sums = self.records.sum_metrics(&filter).await?;
        if sums.record_count == 0 {
            return Ok(None);
        }
        Ok(Some(StateSummary::from(&sums)))
    }

    /// Districts of a state for one period, ranked by workdays generated.
    ///
    /// Equal workday totals are ordered by district code.
    pub async fn top_districts(
        &self,
        state_code: &str,
        financial_year: &str,
        month: u8,
        limit: usize,
    ) -> Result<Vec<DistrictTotals>> {
        let filter = RecordFilter::state(state_code)
            .financial_year(Some(financial_year))
            .month(Some(month));
        self.records.district_totals(&filter, limit).await
    }

    /// Per-period state totals, most recent first
    pub async fn state_monthly_aggregates(
        &self,
        state_code: &str,
        financial_year: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PeriodTotals>> {
        let filter = RecordFilter::state(state_code).financial_year(financial_year);
        self.records.period_totals(&filter, limit).await
    }

    /// Financial years with data, most recent first
    pub async fn financial_years(&self) -> Result<Vec<String>> {
        self.records.financial_years().await
    }
}
