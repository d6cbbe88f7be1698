//! MGNREGA Core - Domain models, normalization, and configuration
//!
//! This crate contains the canonical data model for monthly district
//! statistics, the normalizer that turns loosely-typed upstream rows into
//! that model, and the configuration shared by the ingestion and read paths.

pub mod calendar;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod normalize;

pub use error::{MgnregaError, Result};
