use mgnrega_analytics::AggregationEngine;
use mgnrega_ingest::IngestionPipeline;
use mgnrega_store::ports::{Cache, DistrictStore, RecordStore};
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub districts: Arc<dyn DistrictStore>,
    pub cache: Arc<dyn Cache>,
    pub engine: AggregationEngine,
    /// Absent when upstream credentials are not configured
    pub ingestion: Option<Arc<IngestionPipeline>>,
    pub default_state_code: String,
    pub etl_api_key: Option<String>,
    /// Storage backend name reported by the health check
    pub storage: &'static str,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        districts: Arc<dyn DistrictStore>,
        cache: Arc<dyn Cache>,
        default_state_code: impl Into<String>,
    ) -> Self {
        Self {
            engine: AggregationEngine::new(records.clone()),
            records,
            districts,
            cache,
            ingestion: None,
            default_state_code: default_state_code.into(),
            etl_api_key: None,
            storage: "memory",
        }
    }

    pub fn with_ingestion(mut self, pipeline: Arc<IngestionPipeline>) -> Self {
        self.ingestion = Some(pipeline);
        self
    }

    pub fn with_etl_api_key(mut self, key: Option<String>) -> Self {
        self.etl_api_key = key;
        self
    }

    pub fn with_storage_name(mut self, storage: &'static str) -> Self {
        self.storage = storage;
        self
    }
}
