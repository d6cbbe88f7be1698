//! MGNREGA API - HTTP adapter over ingestion and analytics
//!
//! Thin axum layer: handlers parse parameters, consult the response cache,
//! call the aggregation engine or the ingestion pipeline, and shape JSON.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod scheduler;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use router::create_router;
pub use state::AppState;
