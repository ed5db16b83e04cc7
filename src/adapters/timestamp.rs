//! Timestamp normalization
//!
//! Every source is keyed on a calendar date. Ephemeris services prefix their
//! timestamps with an era marker and spell months out, e.g.
//! `A.D. 2025-Jan-01 00:00:00.0000`; propagators write `2025-01-01`.

use crate::error::AnalysisError;
use chrono::NaiveDate;

/// Era marker prepended by ephemeris services
pub const ERA_PREFIX: &str = "A.D.";

/// Era marker for dates before the common era, which no source here covers
pub const BCE_PREFIX: &str = "B.C.";

const DATE_FORMATS: [&str; 3] = ["%Y-%b-%d", "%Y-%m-%d", "%Y/%m/%d"];

/// Normalize an ephemeris-style timestamp to its calendar date.
///
/// Strips the era prefix, drops any time-of-day part, then accepts either a
/// named-month or a numeric date.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    let trimmed = raw.trim().trim_start_matches('\u{feff}');

    if trimmed.starts_with(BCE_PREFIX) {
        return Err(AnalysisError::DateParseError(format!(
            "unsupported era in '{raw}'"
        )));
    }

    let without_era = trimmed
        .strip_prefix(ERA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(trimmed);

    let date_part = date_token(without_era);

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .ok_or_else(|| AnalysisError::DateParseError(format!("unrecognized date '{raw}'")))
}

/// Leading date token: everything before whitespace or an ISO `T` separator
fn date_token(s: &str) -> &str {
    let token = s.split_whitespace().next().unwrap_or("");
    token.split('T').next().unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_era_prefixed_named_month() {
        assert_eq!(
            normalize_date("A.D. 2025-Jan-01 00:00:00.0000").unwrap(),
            ymd(2025, 1, 1)
        );
        assert_eq!(
            normalize_date("  A.D. 2031-Oct-16 12:30:00.0000 ").unwrap(),
            ymd(2031, 10, 16)
        );
    }

    #[test]
    fn test_numeric_dates() {
        assert_eq!(normalize_date("2025-03-07").unwrap(), ymd(2025, 3, 7));
        assert_eq!(normalize_date("2025-03-07T18:00:00").unwrap(), ymd(2025, 3, 7));
        assert_eq!(normalize_date("2025/03/07").unwrap(), ymd(2025, 3, 7));
        assert_eq!(normalize_date("A.D. 2025-03-07").unwrap(), ymd(2025, 3, 7));
    }

    #[test]
    fn test_time_of_day_is_discarded() {
        let morning = normalize_date("A.D. 2025-Feb-10 00:00:00.0000").unwrap();
        let evening = normalize_date("A.D. 2025-Feb-10 23:59:59.9999").unwrap();
        assert_eq!(morning, evening);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(normalize_date("").is_err());
        assert!(normalize_date("A.D. 2025-Foo-01").is_err());
        assert!(normalize_date("B.C. 0044-Mar-15").is_err());
        assert!(normalize_date("2025-02-30").is_err());
    }
}
