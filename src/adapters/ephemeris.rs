//! Ephemeris-style adapter
//!
//! Parses state exports whose timestamps follow ephemeris service
//! conventions (`datetime_str` column, era prefix, named months). Both the
//! reference ephemeris and the N-body integrator emit this shape.

use crate::error::AnalysisError;
use crate::types::{Source, TrajectorySeries};

use super::timestamp::normalize_date;
use super::{parse_state_rows, StateTableAdapter};

/// Timestamp columns accepted, in order of preference
const TIMESTAMP_COLUMNS: [&str; 3] = ["datetime_str", "timestamp", "date"];

/// Ephemeris export adapter
pub struct EphemerisAdapter;

impl StateTableAdapter for EphemerisAdapter {
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
    fn test_parse_ephemeris_export() {
        let csv = "\
datetime_str,x,y,z,vx,vy,vz
A.D. 2025-Jan-01 00:00:00.0000,3.0,4.0,0.0,0.0,0.01,0.0
A.D. 2025-Jan-06 00:00:00.0000,0.0,5.0,0.0,0.02,0.0,0.0
";
        let series = EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.object, "1_Ceres");
        assert_eq!(series.source, Source::GroundTruth);
        let first = series.points()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!((first.position_magnitude - 5.0).abs() < 1e-12);
        assert!((first.velocity_magnitude - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_extra_columns_and_trailing_separator() {
        let csv = "\
targetname,datetime_str,x,y,z,vx,vy,vz,
1 Ceres,A.D. 2025-Jan-01 00:00:00.0000,1.0,0.0,0.0,0.0,1.0,0.0,
";
        let series = EphemerisAdapter
            .parse("1_Ceres", Source::Simulated, csv)
            .unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let csv = "datetime_str,x,y,z,vx,vy\nA.D. 2025-Jan-01,1,0,0,0,1\n";
        let err = EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("missing column 'vz'"));
    }

    #[test]
    fn test_unparsable_value_is_schema_mismatch() {
        let csv = "datetime_str,x,y,z,vx,vy,vz\nA.D. 2025-Jan-01,1,n/a,0,0,1,0\n";
        let err = EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_overflowing_magnitude_is_schema_mismatch() {
        let csv = "datetime_str,x,y,z,vx,vy,vz\nA.D. 2025-Jan-01,1.5e308,1.5e308,0,0,1,0\n";
        let err = EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_large_finite_state_is_accepted() {
        let csv = "datetime_str,x,y,z,vx,vy,vz\nA.D. 2025-Jan-01,1e200,0,0,0,1,0\n";
        let series = EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .unwrap();
        assert_eq!(series.points()[0].position_magnitude, 1e200);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let csv = "datetime_str,x,y,z,vx,vy,vz\n";
        assert!(EphemerisAdapter
            .parse("1_Ceres", Source::GroundTruth, csv)
            .is_err());
    }
}
