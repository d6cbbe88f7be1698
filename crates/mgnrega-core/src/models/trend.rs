use serde::{Deserialize, Serialize};

/// Direction of change between the two most recent periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

/// Period-over-period comparison of workdays, expenditure and completed works
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub workdays_trend: TrendDirection,
    pub expenditure_trend: TrendDirection,
    pub works_trend: TrendDirection,
    /// Signed percent change, rounded to two decimals
    pub workdays_change: f64,
    pub expenditure_change: f64,
    pub works_change: f64,
}

/// Classification of a district against its state average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceCategory {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl PerformanceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceCategory::Excellent => "excellent",
            PerformanceCategory::Good => "good",
            PerformanceCategory::Average => "average",
            PerformanceCategory::BelowAverage => "below_average",
            PerformanceCategory::Poor => "poor",
        }
    }
}

impl std::fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
