//! MGNREGA Store - Storage ports and adapters
//!
//! This crate defines the storage, lease and cache ports used by ingestion and
//! analytics, and provides in-memory, PostgreSQL and Redis adapters for them.

pub mod cache;
pub mod memory;
pub mod ports;
pub mod postgres;
