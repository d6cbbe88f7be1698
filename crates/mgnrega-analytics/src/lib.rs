//! MGNREGA Analytics - Aggregation engine
//!
//! Read-only summaries over persisted records: totals, latest period, trend
//! windows, period-over-period changes, state rankings and monthly series.
//! No data is never an error here; empty scopes come back as `None` or `[]`.

pub mod engine;
pub mod models;
pub mod trends;

pub use engine::{AggregationEngine, DEFAULT_TREND_WINDOW};
pub use models::{DatedRecord, StateSummary};
pub use trends::{calculate_trends, percent_change, performance_category};
