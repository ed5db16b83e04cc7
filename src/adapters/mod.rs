//! Source table adapters
//!
//! This module provides adapters that parse the tabular state exports of each
//! trajectory producer and map them to date-keyed [`TrajectorySeries`].

mod ephemeris;
mod grid;
pub mod timestamp;

pub use ephemeris::EphemerisAdapter;
pub use grid::GridAdapter;

use crate::error::AnalysisError;
use crate::types::{Source, TrajectoryPoint, TrajectorySeries};
use chrono::NaiveDate;

/// Cartesian state columns every source must carry
pub const STATE_COLUMNS: [&str; 6] = ["x", "y", "z", "vx", "vy", "vz"];

/// Trait for source table adapters
pub trait StateTableAdapter: Send + Sync {
    /// Parse a raw CSV export and convert it to a trajectory series
    fn parse(
        &self,
        object: &str,
        source: Source,
        raw_csv: &str,
    ) -> Result<TrajectorySeries, AnalysisError>;
}

/// Default adapter for each source.
///
/// All sources share one timestamp grammar. The adapters differ in which
/// timestamp column they prefer: ground truth and the integrator export
/// `datetime_str`, the analytic propagator writes `date` on a fixed grid.
pub fn adapter_for(source: Source) -> &'static dyn StateTableAdapter {
    match source {
        Source::GroundTruth | Source::Simulated => &EphemerisAdapter,
        Source::Analytic => &GridAdapter,
    }
}

/// Parse state rows from CSV text.
///
/// The timestamp column is the first of `timestamp_columns` present in the
/// header. Each data row is reduced to position and velocity magnitudes.
pub(crate) fn parse_state_rows(
    object: &str,
    source: Source,
    raw_csv: &str,
    timestamp_columns: &[&str],
    parse_date: fn(&str) -> Result<NaiveDate, AnalysisError>,
) -> Result<TrajectorySeries, AnalysisError> {
    let mismatch = |detail: String| AnalysisError::SchemaMismatch {
        object: object.to_string(),
        series: source,
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw_csv.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim_start_matches('\u{feff}') == name);

    let timestamp_index = timestamp_columns
        .iter()
        .find_map(|name| column(name))
        .ok_or_else(|| {
            mismatch(format!(
                "no timestamp column (expected one of {})",
                timestamp_columns.join(", ")
            ))
        })?;

    let mut state_indices = [0usize; 6];
    for (slot, name) in state_indices.iter_mut().zip(STATE_COLUMNS) {
        *slot = column(name).ok_or_else(|| mismatch(format!("missing column '{name}'")))?;
    }

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;

        let raw_timestamp = record
            .get(timestamp_index)
            .ok_or_else(|| mismatch(format!("line {line}: missing timestamp")))?;
        let date = parse_date(raw_timestamp)
            .map_err(|e| mismatch(format!("line {line}: {e}")))?;

        let mut state = [0.0f64; 6];
        for ((value, index), name) in state.iter_mut().zip(state_indices).zip(STATE_COLUMNS) {
            let field = record
                .get(index)
                .ok_or_else(|| mismatch(format!("line {line}: missing '{name}'")))?;
            *value = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| mismatch(format!("line {line}: invalid '{name}' value '{field}'")))?;
        }

        let point = TrajectoryPoint::from_state(
            date,
            [state[0], state[1], state[2]],
            [state[3], state[4], state[5]],
        );
        if !(point.position_magnitude.is_finite() && point.velocity_magnitude.is_finite()) {
            return Err(mismatch(format!("line {line}: state magnitude out of range")));
        }
        points.push(point);
    }

    if points.is_empty() {
        return Err(mismatch("no data rows".to_string()));
    }

    Ok(TrajectorySeries::new(object, source, points))
}
