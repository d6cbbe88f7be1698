//! MGNREGA Ingest - Upstream client and ingestion pipeline
//!
//! This crate pulls paged district statistics from the data.gov.in resource,
//! normalizes them and upserts them into the record and district stores.

pub mod pipeline;
pub mod states;
pub mod upstream;

// Re-export main types
pub use pipeline::{IngestionPipeline, IngestionRequest, IngestionSummary, INGESTION_LEASE};
pub use states::resolve_state_name;
pub use upstream::{DataGovClient, UpstreamPage, UpstreamQuery, UpstreamSource};
