//! Cell parsing for the master table.

use chrono::{NaiveDate, NaiveDateTime};

use crate::FeatureError;

/// Date layouts seen in upstream exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parses an observation date. Returns `None` if no known layout matches.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parses a count cell. Empty, `nan` and `null` cells are zero.
///
/// # Errors
///
/// Returns [`FeatureError::InvalidNumber`] if the cell is neither blank nor
/// a finite number.
pub fn parse_count(s: &str, line: u64, column: &str) -> Result<f64, FeatureError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        return Ok(0.0);
    }
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FeatureError::InvalidNumber {
            line,
            column: column.to_string(),
            value: s.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_and_day_first_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_date("2025-03-09"), Some(expected));
        assert_eq!(parse_date("09-03-2025"), Some(expected));
        assert_eq!(parse_date("09/03/2025"), Some(expected));
        assert_eq!(parse_date("2025-03-09 00:00:00"), Some(expected));
    }

    #[test]
    fn rejects_unknown_date_layout() {
        assert!(parse_date("March 9th").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn blank_counts_are_zero() {
        assert!(parse_count("", 2, "age_0_5").unwrap().abs() < f64::EPSILON);
        assert!(parse_count("NaN", 2, "age_0_5").unwrap().abs() < f64::EPSILON);
        assert!((parse_count(" 12.0 ", 2, "age_0_5").unwrap() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_count_is_an_error() {
        let err = parse_count("twelve", 7, "bio_old").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid number 'twelve' in column 'bio_old' on line 7"
        );
    }
}
