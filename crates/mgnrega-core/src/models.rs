pub mod district;
pub mod filter;
pub mod metrics;
pub mod record;
pub mod trend;

pub use district::{Coordinates, District};
pub use filter::RecordFilter;
pub use metrics::{AggregatedMetrics, DistrictTotals, MetricSums, PeriodTotals};
pub use record::{CanonicalRecord, RecordKey};
pub use trend::{PerformanceCategory, TrendDirection, Trends};
