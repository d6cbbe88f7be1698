//! Normalization of upstream rows into [`CanonicalRecord`]s
//!
//! The upstream API returns every field as a string in Title_Case, and the set
//! of fields present varies across years. Rows are therefore handled as an
//! untyped key-value map and every access here is explicit and defaulted.

use serde_json::{Map, Value};

use crate::calendar;
use crate::models::{CanonicalRecord, District};

/// One upstream row, exactly as received
pub type RawRecord = Map<String, Value>;

/// Upstream field names
pub mod fields {
    pub const MONTH: &str = "month";
    pub const DISTRICT_CODE: &str = "district_code";
    pub const DISTRICT_NAME: &str = "district_name";
    pub const STATE_CODE: &str = "state_code";
    pub const STATE_NAME: &str = "state_name";
    /// Financial year has been published under several names
    pub const FINANCIAL_YEAR: [&str; 4] = ["fin_year", "financial_year", "financialYear", "finyear"];

    pub const CENTRAL_LIABILITY_PERSONDAYS: &str = "Persondays_of_Central_Liability_so_far";
    pub const SC_PERSONDAYS: &str = "SC_persondays";
    pub const ST_PERSONDAYS: &str = "ST_persondays";
    pub const WOMEN_PERSONDAYS: &str = "Women_Persondays";

    pub const INDIVIDUALS_WORKED: &str = "Total_Individuals_Worked";
    pub const HOUSEHOLDS_WORKED: &str = "Total_Households_Worked";

    pub const TOTAL_EXPENDITURE: &str = "Total_Exp";
    pub const WAGES: &str = "Wages";
    pub const MATERIAL_WAGES: &str = "Material_and_skilled_Wages";

    pub const COMPLETED_WORKS: &str = "Number_of_Completed_Works";
    pub const ONGOING_WORKS: &str = "Number_of_Ongoing_Works";
    pub const WORKS_TAKEN_UP: &str = "Total_No_of_Works_Takenup";

    pub const APPROVED_LABOUR_BUDGET: &str = "Approved_Labour_Budget";
    pub const AVERAGE_WAGE_RATE: &str = "Average_Wage_rate_per_day_per_person";
}

/// Normalize one upstream row.
///
/// Returns `None` when the month is not 1-12 or when the district code, state
/// code or financial year is empty. Rejection is not an error; callers count it.
pub fn normalize_record(raw: &RawRecord) -> Option<CanonicalRecord> {
    let Some(month) = raw.get(fields::MONTH).and_then(calendar::parse_month) else {
        tracing::warn!(
            district_code = %text_field(raw, fields::DISTRICT_CODE),
            month = ?raw.get(fields::MONTH),
            "Invalid month in record"
        );
        return None;
    };

    let district_code = text_field(raw, fields::DISTRICT_CODE);
    let state_code = text_field(raw, fields::STATE_CODE);
    let financial_year = first_text_field(raw, &fields::FINANCIAL_YEAR);

    if district_code.is_empty() || state_code.is_empty() || financial_year.is_empty() {
        tracing::debug!(
            district_code = %district_code,
            state_code = %state_code,
            financial_year = %financial_year,
            "Dropping record with missing identifiers"
        );
        return None;
    }

    let financial_year_start = calendar::financial_year_start(&financial_year);

    let persons_worked = int_field(raw, fields::INDIVIDUALS_WORKED);
    let workdays_generated = workdays_generated(raw);
    let workdays_per_person = if persons_worked > 0 {
        workdays_generated / persons_worked as f64
    } else {
        0.0
    };

    Some(CanonicalRecord {
        district_code,
        state_code,
        financial_year,
        financial_year_start,
        month,
        persons_worked,
        households_worked: int_field(raw, fields::HOUSEHOLDS_WORKED),
        workdays_generated,
        workdays_per_person,
        total_expenditure: num_field(raw, fields::TOTAL_EXPENDITURE),
        wage_expenditure: num_field(raw, fields::WAGES),
        material_expenditure: num_field(raw, fields::MATERIAL_WAGES),
        works_completed: int_field(raw, fields::COMPLETED_WORKS),
        works_in_progress: int_field(raw, fields::ONGOING_WORKS),
        works_sanctioned: int_field(raw, fields::WORKS_TAKEN_UP),
        persons_demanded: raw.get(fields::APPROVED_LABOUR_BUDGET).map(|v| parse_num(v).floor() as i64),
        avg_wage_rate: raw.get(fields::AVERAGE_WAGE_RATE).map(parse_num),
    })
}

/// District reference entry for a normalized row.
///
/// Names come from the raw row; the state name falls back to the state code.
pub fn district_for(raw: &RawRecord, record: &CanonicalRecord) -> District {
    let state_name = text_field(raw, fields::STATE_NAME);
    District::new(
        record.district_code.clone(),
        text_field(raw, fields::DISTRICT_NAME),
        record.state_code.clone(),
        if state_name.is_empty() { record.state_code.clone() } else { state_name },
    )
}

/// Person-days generated.
///
/// Uses the central-liability total when present and non-zero; older rows lack
/// it, so fall back to the SC + ST + women subtotals.
fn workdays_generated(raw: &RawRecord) -> f64 {
    let central = num_field(raw, fields::CENTRAL_LIABILITY_PERSONDAYS);
    if central != 0.0 {
        return central;
    }

    num_field(raw, fields::SC_PERSONDAYS)
        + num_field(raw, fields::ST_PERSONDAYS)
        + num_field(raw, fields::WOMEN_PERSONDAYS)
}

fn text_field(raw: &RawRecord, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn first_text_field(raw: &RawRecord, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text_field(raw, key))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn num_field(raw: &RawRecord, key: &str) -> f64 {
    raw.get(key).map(parse_num).unwrap_or(0.0)
}

fn int_field(raw: &RawRecord, key: &str) -> i64 {
    num_field(raw, key).floor() as i64
}

/// Tolerant float parse: numbers pass through, strings are read up to the
/// longest numeric prefix, anything else is 0.
pub fn parse_num(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_float_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn parse_float_prefix(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return value.is_finite().then_some(value);
    }

    let candidate_len = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(idx, c)| idx + c.len_utf8())
        .last()?;

    (1..=candidate_len)
        .rev()
        .filter_map(|end| trimmed.get(..end))
        .find_map(|prefix| prefix.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
