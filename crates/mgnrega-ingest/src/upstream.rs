//! data.gov.in client
//!
//! The client performs exactly one request per call. Retry and pacing policy
//! belong to the pipeline.

use async_trait::async_trait;
use mgnrega_core::calendar;
use mgnrega_core::config::DataGovConfig;
use mgnrega_core::error::{MgnregaError, Result};
use mgnrega_core::normalize::RawRecord;
use serde_json::Value;

/// Filters for one upstream request; unset filters are omitted from the query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamQuery {
    pub state_name: Option<String>,
    pub district_code: Option<String>,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
}

/// One page of raw upstream records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamPage {
    pub records: Vec<RawRecord>,
    /// Total matching records, when the upstream reports it
    pub total: Option<u64>,
}

/// Port for the paged upstream feed
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch_page(&self, query: &UpstreamQuery, offset: usize, limit: usize)
        -> Result<UpstreamPage>;
}

/// HTTP client for the data.gov.in resource API
pub struct DataGovClient {
    endpoint: String,
    api_key: String,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl DataGovClient {
    pub fn new(config: &DataGovConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MgnregaError::upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/{}", config.api_base_url, config.resource_id),
            api_key: config.api_key.clone(),
            timeout_ms: config.request_timeout.as_millis() as u64,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_params(&self, query: &UpstreamQuery, offset: usize, limit: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api-key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];

        if let Some(state) = &query.state_name {
            params.push(("filters[state_name]", state.clone()));
        }
        if let Some(code) = &query.district_code {
            params.push(("filters[district_code]", code.clone()));
        }
        if let Some(fy) = &query.financial_year {
            params.push(("filters[fin_year]", fy.clone()));
        }
        if let Some(month) = query.month {
            let value = calendar::month_name(month).map_or_else(|| month.to_string(), String::from);
            params.push(("filters[month]", value));
        }

        params
    }

    fn transport_error(&self, err: reqwest::Error) -> MgnregaError {
        if err.is_timeout() {
            MgnregaError::Timeout {
                timeout_ms: self.timeout_ms,
                message: err.to_string(),
            }
        } else {
            MgnregaError::Upstream {
                status: err.status().map(|s| s.as_u16()),
                body: None,
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl UpstreamSource for DataGovClient {
    async fn fetch_page(
        &self,
        query: &UpstreamQuery,
        offset: usize,
        limit: usize,
    ) -> Result<UpstreamPage> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(query, offset, limit))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "data.gov.in API error");
            return Err(MgnregaError::Upstream {
                status: Some(status.as_u16()),
                body: Some(body),
                message: format!("upstream responded with {}", status),
            });
        }

        let payload: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                MgnregaError::Upstream {
                    status: Some(status.as_u16()),
                    body: None,
                    message: format!("Failed to parse upstream response: {}", e),
                }
            }
        })?;

        Ok(parse_page(payload))
    }
}

/// Interpret either `{records: [...], total}` or a bare array.
///
/// Any other shape yields an empty page, which ends a run.
pub fn parse_page(payload: Value) -> UpstreamPage {
    match payload {
        Value::Object(mut body) => match body.remove("records") {
            Some(Value::Array(items)) => {
                let records = into_raw_records(items);
                let total = body
                    .get("total")
                    .and_then(total_from_value)
                    .filter(|t| *t > 0)
                    .unwrap_or(records.len() as u64);
                UpstreamPage {
                    records,
                    total: Some(total),
                }
            }
            _ => {
                tracing::warn!("Unexpected upstream response structure: no records array");
                UpstreamPage {
                    records: Vec::new(),
                    total: Some(0),
                }
            }
        },
        Value::Array(items) => UpstreamPage {
            records: into_raw_records(items),
            total: None,
        },
        other => {
            tracing::warn!(kind = ?other, "Unexpected upstream response structure");
            UpstreamPage::default()
        }
    }
}

/// Keeps one entry per upstream item so page size reflects what was sent.
/// Non-object items become empty records, which the Normalizer rejects.
fn into_raw_records(items: Vec<Value>) -> Vec<RawRecord> {
    let mut malformed = 0usize;
    let records: Vec<RawRecord> = items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => map,
            _ => {
                malformed += 1;
                RawRecord::new()
            }
        })
        .collect();

    if malformed > 0 {
        tracing::warn!(malformed, "Upstream page contains non-object records");
    }
    records
}

fn total_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
