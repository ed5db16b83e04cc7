//! Fixed-grid adapter
//!
//! Parses state exports from the closed-form propagator, which samples an
//! explicit day grid. Its exports usually carry plain ISO dates in a `date`
//! column, but ephemeris-style timestamps are accepted too.

use crate::error::AnalysisError;
use crate::types::{Source, TrajectorySeries};

use super::timestamp::normalize_date;
use super::{parse_state_rows, StateTableAdapter};

/// Timestamp columns accepted, in order of preference
const TIMESTAMP_COLUMNS: [&str; 3] = ["date", "timestamp", "datetime_str"];

/// Propagator grid export adapter
pub struct GridAdapter;

impl StateTableAdapter for GridAdapter {
    fn parse(
        &self,
        object: &str,
        source: Source,
        raw_csv: &str,
    ) -> Result<TrajectorySeries, AnalysisError> {
        parse_state_rows(object, source, raw_csv, &TIMESTAMP_COLUMNS, normalize_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_grid_export() {
        // the propagator also writes an r column; magnitudes are recomputed
        let csv = "\
date,x,y,z,vx,vy,vz,r
2025-01-01,1.0,0.0,0.0,0.0,0.0172,0.0,1.0
2025-01-02,0.9998,0.0172,0.0,-0.0003,0.0172,0.0,1.0
";
        let series = GridAdapter.parse("3_Juno", Source::Analytic, csv).unwrap();
        assert_eq!(series.len(), 2);
        assert!((series.points()[0].velocity_magnitude - 0.0172).abs() < 1e-12);
    }

    #[test]
    fn test_accepts_ephemeris_timestamps() {
        let jan_first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let csv = "datetime_str,x,y,z,vx,vy,vz\nA.D. 2025-Jan-01 00:00:00.0000,1,0,0,0,1,0\n";
        let series = GridAdapter.parse("3_Juno", Source::Analytic, csv).unwrap();
        assert_eq!(series.points()[0].date, jan_first);

        let csv = "date,x,y,z,vx,vy,vz\n2025-Jan-01,1,0,0,0,1,0\n";
        let series = GridAdapter.parse("3_Juno", Source::Analytic, csv).unwrap();
        assert_eq!(series.points()[0].date, jan_first);
    }

    #[test]
    fn test_missing_timestamp_column_is_schema_mismatch() {
        let csv = "epoch,x,y,z,vx,vy,vz\n2025-01-01,1,0,0,0,1,0\n";
        let err = GridAdapter.parse("3_Juno", Source::Analytic, csv).unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch { .. }));
    }
}
