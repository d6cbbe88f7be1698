use serde::{Deserialize, Serialize};

use super::record::CanonicalRecord;

/// Selection over persisted records; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub district_code: Option<String>,
    pub state_code: Option<String>,
    pub financial_year: Option<String>,
    pub month: Option<u8>,
}

impl RecordFilter {
    /// Records of a single district
    pub fn district(district_code: impl Into<String>) -> Self {
        Self {
            district_code: Some(district_code.into()),
            ..Self::default()
        }
    }

    /// Records of every district in a state
    pub fn state(state_code: impl Into<String>) -> Self {
        Self {
            state_code: Some(state_code.into()),
            ..Self::default()
        }
    }

    pub fn financial_year(mut self, financial_year: Option<impl Into<String>>) -> Self {
        self.financial_year = financial_year.map(Into::into);
        self
    }

    pub fn month(mut self, month: Option<u8>) -> Self {
        self.month = month;
        self
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        self.district_code.as_deref().map_or(true, |c| c == record.district_code)
            && self.state_code.as_deref().map_or(true, |c| c == record.state_code)
            && self.financial_year.as_deref().map_or(true, |fy| fy == record.financial_year)
            && self.month.map_or(true, |m| m == record.month)
    }
}
