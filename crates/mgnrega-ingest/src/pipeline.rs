//! Ingestion pipeline
//!
//! A run walks the upstream pages sequentially:
//!
//! ```text
//! Fetching --empty page--> Done
//!    |
//!    +--records--> Saving --full page--> Fetching (offset += limit)
//!                    |
//!                    +--short page--> Done
//! ```
//!
//! Timeouts retry the same offset with capped exponential backoff. Other
//! failures retry the same offset after a cooldown until too many happen in a
//! row, at which point the run stops with whatever it has saved.

use futures::future::join_all;
use mgnrega_core::config::{AppConfig, PipelineConfig};
use mgnrega_core::error::Result;
use mgnrega_core::models::CanonicalRecord;
use mgnrega_core::normalize::{district_for, normalize_record, RawRecord};
use mgnrega_store::cache::keys;
use mgnrega_store::ports::{Cache, DistrictStore, RecordStore, RunLease};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::states::resolve_state_name;
use crate::upstream::{UpstreamPage, UpstreamQuery, UpstreamSource};

/// Lease name shared by every scheduled ingestion run
pub const INGESTION_LEASE: &str = "ingestion";

/// Parameters of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    /// State code such as "MP"; falls back to the configured default state
    pub state_code: Option<String>,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
}

/// Outcome of a run. A non-zero `errors` means some pages may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    /// Records upserted
    pub processed: u64,
    /// Distinct (district, state) pairs seen
    pub districts: u64,
    /// Non-timeout failures, plus timeouts that exhausted their retries
    pub errors: u64,
    /// Raw records dropped by normalization
    pub rejected: u64,
    /// Run stopped on the consecutive-error ceiling
    pub aborted: bool,
}

struct PageOutcome {
    fetched: usize,
    saved: u64,
    rejected: u64,
}

/// Sequential fetch-normalize-upsert loop over the upstream feed
pub struct IngestionPipeline {
    source: Arc<dyn UpstreamSource>,
    records: Arc<dyn RecordStore>,
    districts: Arc<dyn DistrictStore>,
    cache: Option<Arc<dyn Cache>>,
    lease: Option<Arc<dyn RunLease>>,
    default_state_name: String,
    page_limit: usize,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn UpstreamSource>,
        records: Arc<dyn RecordStore>,
        districts: Arc<dyn DistrictStore>,
        app: &AppConfig,
    ) -> Self {
        Self {
            source,
            records,
            districts,
            cache: None,
            lease: None,
            default_state_name: app.default_state_name.clone(),
            page_limit: app.data_gov.page_limit.max(1),
            config: app.pipeline.clone(),
        }
    }

    /// Cache whose dashboard and map entries are cleared after each run
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Lease used by [`run_exclusive`](Self::run_exclusive)
    pub fn with_lease(mut self, lease: Arc<dyn RunLease>) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn with_pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    /// Run unconditionally.
    ///
    /// Manual triggers go through here. Overlap with a scheduled run is only
    /// wasteful since every write is an upsert, so a held lease is just logged.
    pub async fn run(&self, request: &IngestionRequest) -> Result<IngestionSummary> {
        if let Some(lease) = &self.lease {
            match lease.is_held(INGESTION_LEASE).await {
                Ok(true) => tracing::warn!(
                    "Another ingestion run holds the lease; running anyway"
                ),
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "Could not check ingestion lease"),
            }
        }
        Ok(self.execute(request).await)
    }

    /// Run only if the ingestion lease can be taken.
    ///
    /// Returns `None` when another holder has it. Without a configured lease
    /// this behaves like [`run`](Self::run).
    pub async fn run_exclusive(
        &self,
        request: &IngestionRequest,
        holder: &str,
    ) -> Result<Option<IngestionSummary>> {
        let Some(lease) = &self.lease else {
            return Ok(Some(self.execute(request).await));
        };

        if !lease
            .try_acquire(INGESTION_LEASE, holder, self.config.lease_ttl)
            .await?
        {
            tracing::info!(holder, "Ingestion lease held elsewhere; skipping run");
            return Ok(None);
        }

        let summary = self.execute(request).await;

        if let Err(e) = lease.release(INGESTION_LEASE, holder).await {
            tracing::warn!(error = %e, holder, "Failed to release ingestion lease");
        }
        Ok(Some(summary))
    }

    async fn execute(&self, request: &IngestionRequest) -> IngestionSummary {
        let query = UpstreamQuery {
            state_name: resolve_state_name(request.state_code.as_deref())
                .or_else(|| Some(self.default_state_name.clone()))
                .filter(|s| !s.is_empty()),
            district_code: None,
            financial_year: request.financial_year.clone(),
            month: request.month,
        };

        tracing::info!(
            state = query.state_name.as_deref().unwrap_or("(all)"),
            financial_year = query.financial_year.as_deref().unwrap_or("(all)"),
            month = ?query.month,
            page_limit = self.page_limit,
            "Starting ingestion run"
        );

        let limit = self.page_limit;
        let mut offset = 0usize;
        let mut consecutive_errors = 0u32;
        let mut retry_attempt = 0u32;
        let mut upstream_total: Option<u64> = None;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut summary = IngestionSummary::default();
        let started = Instant::now();

        loop {
            let attempt = self
                .fetch_and_save(&query, offset, limit, &mut seen, &mut upstream_total)
                .await;

            match attempt {
                Ok(None) => break,
                Ok(Some(page)) => {
                    summary.processed += page.saved;
                    summary.rejected += page.rejected;
                    consecutive_errors = 0;
                    retry_attempt = 0;

                    log_progress(page.saved, summary.processed, upstream_total, started);

                    let has_more = page.fetched == limit;
                    offset += limit;
                    if !has_more {
                        break;
                    }
                    tokio::time::sleep(self.config.page_delay).await;
                }
                Err(e) if e.is_timeout() && retry_attempt < self.config.max_timeout_retries => {
                    retry_attempt += 1;
                    let delay = self.config.timeout_backoff(retry_attempt);
                    tracing::warn!(
                        offset,
                        attempt = retry_attempt,
                        max_retries = self.config.max_timeout_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream timeout, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    consecutive_errors += 1;
                    summary.errors += 1;
                    tracing::error!(offset, error = %e, consecutive_errors, "Ingestion page failed");

                    if consecutive_errors >= self.config.max_consecutive_errors {
                        tracing::error!("Too many consecutive errors, stopping ingestion early");
                        summary.aborted = true;
                        break;
                    }

                    tokio::time::sleep(self.config.error_cooldown).await;
                    retry_attempt = 0;
                }
            }
        }

        summary.districts = seen.len() as u64;
        self.invalidate_cache().await;

        tracing::info!(
            processed = summary.processed,
            districts = summary.districts,
            errors = summary.errors,
            rejected = summary.rejected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion run complete"
        );

        summary
    }

    /// One Fetching step followed by Saving; `None` means the page was empty
    async fn fetch_and_save(
        &self,
        query: &UpstreamQuery,
        offset: usize,
        limit: usize,
        seen: &mut HashSet<(String, String)>,
        upstream_total: &mut Option<u64>,
    ) -> Result<Option<PageOutcome>> {
        let UpstreamPage { records, total } = self.source.fetch_page(query, offset, limit).await?;

        if upstream_total.is_none() {
            if let Some(total) = total.filter(|t| *t > 0) {
                tracing::info!(total, "Upstream reports matching records");
                *upstream_total = Some(total);
            }
        }

        if records.is_empty() {
            return Ok(None);
        }

        let fetched = records.len();
        let (saved, rejected) = self.save_page(&records, seen).await?;
        Ok(Some(PageOutcome {
            fetched,
            saved,
            rejected,
        }))
    }

    async fn save_page(
        &self,
        raw_records: &[RawRecord],
        seen: &mut HashSet<(String, String)>,
    ) -> Result<(u64, u64)> {
        let mut normalized: Vec<CanonicalRecord> = Vec::with_capacity(raw_records.len());
        let mut new_districts = Vec::new();
        let mut new_keys = HashSet::new();

        for raw in raw_records {
            let Some(record) = normalize_record(raw) else {
                continue;
            };
            let key = (record.district_code.clone(), record.state_code.clone());
            if !seen.contains(&key) && new_keys.insert(key) {
                new_districts.push(district_for(raw, &record));
            }
            normalized.push(record);
        }
        let rejected = (raw_records.len() - normalized.len()) as u64;

        if !new_districts.is_empty() {
            let results = join_all(
                new_districts
                    .iter()
                    .map(|district| self.districts.upsert_district(district)),
            )
            .await;
            results.into_iter().collect::<Result<Vec<()>>>()?;
            seen.extend(new_keys);
        }

        for batch in normalized.chunks(self.config.upsert_batch_size.max(1)) {
            self.records.upsert_records(batch).await?;
        }

        if rejected > 0 {
            tracing::debug!(rejected, "Dropped records that failed normalization");
        }

        Ok((normalized.len() as u64, rejected))
    }

    async fn invalidate_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        for pattern in keys::INGESTION_INVALIDATES {
            if let Err(e) = cache.invalidate(pattern).await {
                tracing::warn!(pattern, error = %e, "Cache invalidation failed");
            }
        }
    }
}

fn log_progress(saved: u64, processed: u64, upstream_total: Option<u64>, started: Instant) {
    let Some(total) = upstream_total else {
        tracing::info!(saved, processed, "Saved page");
        return;
    };

    let percentage = ((processed as f64 / total as f64) * 100.0).round().min(100.0);
    let elapsed_secs = started.elapsed().as_secs_f64().max(1.0);
    let rate = processed as f64 / elapsed_secs;
    let remaining = total.saturating_sub(processed) as f64;
    let eta_minutes = if rate > 0.0 {
        Some((remaining / rate / 60.0).ceil() as u64)
    } else {
        None
    };

    tracing::info!(
        saved,
        processed,
        total,
        percentage,
        eta_minutes = ?eta_minutes,
        "Saved page"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = IngestionSummary {
            processed: 7,
            districts: 2,
            errors: 0,
            rejected: 3,
            aborted: false,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["processed"], 7);
        assert_eq!(json["rejected"], 3);
        assert_eq!(json["aborted"], false);
    }

    #[test]
    fn test_request_deserializes_partial_input() {
        let request: IngestionRequest =
            serde_json::from_value(serde_json::json!({"stateCode": "MP", "month": 5})).unwrap();
        assert_eq!(request.state_code.as_deref(), Some("MP"));
        assert_eq!(request.financial_year, None);
        assert_eq!(request.month, Some(5));
    }
}
