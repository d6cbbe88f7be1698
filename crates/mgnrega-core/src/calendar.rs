//! Calendar and unit helpers
//!
//! The upstream publishes statistics per Indian financial year ("2023-24"),
//! which runs April to March, and reports money in crore. Everything that
//! shows a human-facing year goes through [`calendar_year`].

use chrono::Datelike;
use serde_json::Value;

/// One crore is ten million currency units
pub const CRORE: f64 = 10_000_000.0;

/// One lakh is one hundred thousand currency units
pub const LAKH_PER_CRORE: f64 = 100.0;

/// First month of the financial year
pub const FINANCIAL_YEAR_START_MONTH: u8 = 4;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse a month from an upstream value.
///
/// Accepts a number, a numeric string, or a month name whose first three
/// letters match an abbreviation (case-insensitive). Returns `None` for
/// anything outside 1-12.
pub fn parse_month(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_f64().and_then(month_from_number),
        Value::String(s) => parse_month_str(s),
        _ => None,
    }
}

/// Parse a month from its textual form
pub fn parse_month_str(value: &str) -> Option<u8> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(number) = trimmed.parse::<f64>() {
        return month_from_number(number);
    }

    let prefix: String = trimmed.chars().take(3).collect::<String>().to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| *abbr == prefix)
        .map(|idx| idx as u8 + 1)
}

fn month_from_number(number: f64) -> Option<u8> {
    if !number.is_finite() {
        return None;
    }
    let floored = number.floor();
    if (1.0..=12.0).contains(&floored) {
        Some(floored as u8)
    } else {
        None
    }
}

/// Three-letter month name used by the upstream month filter
pub fn month_name(month: u8) -> Option<&'static str> {
    MONTH_NAMES.get(usize::from(month).checked_sub(1)?).copied()
}

/// First calendar year of a financial year such as "2023-24".
///
/// Falls back to the current calendar year when the prefix is not a number.
pub fn financial_year_start(financial_year: &str) -> i32 {
    parse_financial_year_start(financial_year).unwrap_or_else(|| chrono::Local::now().year())
}

fn parse_financial_year_start(financial_year: &str) -> Option<i32> {
    let prefix = financial_year.split('-').next()?.trim();
    let digits: String = prefix.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Calendar year that a (financial year, month) pair falls in.
///
/// Months April-December belong to the starting year; January-March to the next.
pub fn calendar_year(financial_year: &str, month: u8) -> i32 {
    calendar_year_from_start(financial_year_start(financial_year), month)
}

/// Same as [`calendar_year`] when the start year is already known
pub fn calendar_year_from_start(financial_year_start: i32, month: u8) -> i32 {
    if month >= FINANCIAL_YEAR_START_MONTH {
        financial_year_start
    } else {
        financial_year_start + 1
    }
}

/// Convert a crore-denominated value to plain currency units.
///
/// Only used at presentation boundaries; stored values stay in crore.
pub fn crores_to_amount(crores: f64) -> f64 {
    crores * CRORE
}

/// Format a crore-denominated value for display
pub fn format_amount(crores: f64) -> String {
    if crores >= 1.0 {
        format!("₹{:.2} Cr", crores)
    } else {
        format!("₹{:.2} L", crores * LAKH_PER_CRORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_month_abbreviations() {
        assert_eq!(parse_month(&json!("Dec")), Some(12));
        assert_eq!(parse_month(&json!("jan")), Some(1));
        assert_eq!(parse_month(&json!("SEPT")), Some(9));
        assert_eq!(parse_month(&json!("  April ")), Some(4));
    }

    #[test]
    fn test_parse_month_numeric() {
        assert_eq!(parse_month(&json!(7)), Some(7));
        assert_eq!(parse_month(&json!("11")), Some(11));
        assert_eq!(parse_month(&json!("3.0")), Some(3));
    }

    #[test]
    fn test_parse_month_rejects_out_of_range() {
        assert_eq!(parse_month(&json!(0)), None);
        assert_eq!(parse_month(&json!(13)), None);
        assert_eq!(parse_month(&json!("15")), None);
        assert_eq!(parse_month(&json!("")), None);
        assert_eq!(parse_month(&json!("Foo")), None);
        assert_eq!(parse_month(&json!(null)), None);
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), Some("Jan"));
        assert_eq!(month_name(12), Some("Dec"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_financial_year_start() {
        assert_eq!(financial_year_start("2023-24"), 2023);
        assert_eq!(financial_year_start("2019-2020"), 2019);
    }

    #[test]
    fn test_financial_year_start_falls_back_to_current_year() {
        assert_eq!(financial_year_start("unknown"), chrono::Local::now().year());
    }

    #[test]
    fn test_calendar_year_examples() {
        assert_eq!(calendar_year("2023-24", 2), 2024);
        assert_eq!(calendar_year("2023-24", 5), 2023);
        assert_eq!(calendar_year("2023-24", 4), 2023);
        assert_eq!(calendar_year("2023-24", 3), 2024);
    }

    #[test]
    fn test_amount_conversion_and_format() {
        assert_eq!(crores_to_amount(1.5), 15_000_000.0);
        assert_eq!(format_amount(123.456), "₹123.46 Cr");
        assert_eq!(format_amount(0.25), "₹25.00 L");
    }

    proptest! {
        #[test]
        fn prop_calendar_year_follows_april_boundary(start in 2000i32..2100, month in 1u8..=12) {
            let fy = format!("{}-{:02}", start, (start + 1) % 100);
            let expected = if month >= 4 { start } else { start + 1 };
            prop_assert_eq!(calendar_year(&fy, month), expected);
        }

        #[test]
        fn prop_numeric_months_roundtrip_through_names(month in 1u8..=12) {
            let name = month_name(month).unwrap();
            prop_assert_eq!(parse_month_str(name), Some(month));
        }
    }
}
