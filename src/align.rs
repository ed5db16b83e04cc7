//! Temporal alignment
//!
//! Joins the ground-truth, simulated, and analytic series of one object on
//! their calendar date. Only dates present in all three survive.

use crate::error::AnalysisError;
use crate::types::{AlignedRecord, AlignedSet, Source, TrajectoryPoint, TrajectorySeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Inner join of three series on date, ordered by date.
///
/// Dates missing from any series drop silently.
pub fn join_on_date(
    ground_truth: &TrajectorySeries,
    simulated: &TrajectorySeries,
    analytic: &TrajectorySeries,
) -> Vec<AlignedRecord> {
    let simulated = index_by_date(simulated);
    let analytic = index_by_date(analytic);

    ground_truth
        .points()
        .iter()
        .filter_map(|truth| {
            let sim = simulated.get(&truth.date)?;
            let ana = analytic.get(&truth.date)?;
            Some(AlignedRecord {
                date: truth.date,
                r_truth: truth.position_magnitude,
                v_truth: truth.velocity_magnitude,
                r_simulated: sim.position_magnitude,
                v_simulated: sim.velocity_magnitude,
                r_analytic: ana.position_magnitude,
                v_analytic: ana.velocity_magnitude,
            })
        })
        .collect()
}

/// Align three series and apply the minimum-sample gate.
///
/// Each series must come from the source its argument names, otherwise the
/// set is a schema mismatch. Objects with fewer than `min_rows` aligned dates
/// are rejected as insufficient.
pub fn align(
    ground_truth: &TrajectorySeries,
    simulated: &TrajectorySeries,
    analytic: &TrajectorySeries,
    min_rows: usize,
) -> Result<AlignedSet, AnalysisError> {
    for (series, expected) in [
        (ground_truth, Source::GroundTruth),
        (simulated, Source::Simulated),
        (analytic, Source::Analytic),
    ] {
        if series.source != expected {
            return Err(AnalysisError::SchemaMismatch {
                object: ground_truth.object.clone(),
                series: expected,
                detail: format!("expected a {expected} series, got {}", series.source),
            });
        }
    }

    let records = join_on_date(ground_truth, simulated, analytic);

    if records.len() < min_rows {
        return Err(AnalysisError::InsufficientSamples {
            object: ground_truth.object.clone(),
            found: records.len(),
            required: min_rows,
        });
    }

    Ok(AlignedSet {
        object: ground_truth.object.clone(),
        records,
    })
}

fn index_by_date(series: &TrajectorySeries) -> BTreeMap<NaiveDate, &TrajectoryPoint> {
    series.points().iter().map(|p| (p.date, p)).collect()
}
