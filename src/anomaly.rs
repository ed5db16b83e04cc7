//! Local anomaly detection
//!
//! Scores every aligned record against the object's own deviation history
//! and summarizes where, and how persistently, a model misbehaves.

use crate::baseline::ChannelBaseline;
use crate::config::AnomalyThresholds;
use crate::metrics::deviation_series;
use crate::types::{
    AlignedSet, AnomalyRecord, AnomalySummary, Channel, ErrorMode, Model, StabilityClass,
    TemporalBehavior,
};

/// Per-record scores and the summary for one (object, model)
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub records: Vec<AnomalyRecord>,
    pub summary: AnomalySummary,
}

/// Local z-score anomaly detector
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector {
    thresholds: AnomalyThresholds,
}

impl AnomalyDetector {
    pub fn new(thresholds: AnomalyThresholds) -> Self {
        Self { thresholds }
    }

    /// Score every record of an aligned set for one model
    pub fn detect(&self, set: &AlignedSet, model: Model) -> AnomalyReport {
        let delta_r = deviation_series(set, model, Channel::Position).values;
        let delta_v = deviation_series(set, model, Channel::Velocity).values;
        let baseline_r = ChannelBaseline::from_values(&delta_r);
        let baseline_v = ChannelBaseline::from_values(&delta_v);

        let records: Vec<AnomalyRecord> = set
            .records
            .iter()
            .zip(delta_r.iter().zip(&delta_v))
            .map(|(record, (&dr, &dv))| {
                let z_r = baseline_r.z_score(dr);
                let z_v = baseline_v.z_score(dv);
                let z_score = z_r.max(z_v);
                AnomalyRecord {
                    date: record.date,
                    delta_r: dr,
                    delta_v: dv,
                    z_r,
                    z_v,
                    z_score,
                    anomaly: z_score >= self.thresholds.z_threshold,
                }
            })
            .collect();

        let summary = self.summarize(&set.object, model, &records, &baseline_r, &baseline_v);
        AnomalyReport { records, summary }
    }

    fn summarize(
        &self,
        object: &str,
        model: Model,
        records: &[AnomalyRecord],
        baseline_r: &ChannelBaseline,
        baseline_v: &ChannelBaseline,
    ) -> AnomalySummary {
        let anomalies = records.iter().filter(|r| r.anomaly);
        let anomaly_count = anomalies.clone().count();
        let velocity_dominated = anomalies.filter(|r| r.z_v > r.z_r).count();
        let position_dominated = anomaly_count - velocity_dominated;
        let max_z_score = records.iter().map(|r| r.z_score).fold(0.0, f64::max);

        let dominant_error_mode = if anomaly_count == 0 {
            ErrorMode::None
        } else if position_dominated > velocity_dominated {
            ErrorMode::Position
        } else {
            ErrorMode::Velocity
        };

        let temporal_behavior = if anomaly_count >= self.thresholds.persistent_min_count {
            TemporalBehavior::Persistent
        } else if anomaly_count > 0 {
            TemporalBehavior::Isolated
        } else {
            TemporalBehavior::None
        };

        let stability_class = if anomaly_count == 0 {
            StabilityClass::Stable
        } else if max_z_score >= self.thresholds.unstable_z {
            StabilityClass::Unstable
        } else {
            StabilityClass::MarginallyStable
        };

        AnomalySummary {
            object: object.to_string(),
            model,
            samples: records.len(),
            mean_delta_r: baseline_r.mean,
            mean_delta_v: baseline_v.mean,
            max_z_score,
            anomaly_count,
            velocity_dominated_anomalies: velocity_dominated,
            position_dominated_anomalies: position_dominated,
            dominant_error_mode,
            temporal_behavior,
            physical_interpretation: dominant_error_mode.interpretation().to_string(),
            stability_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AlignedRecord;
    use chrono::{Duration, NaiveDate};

    /// Aligned set whose simulated deviations are `dr` / `dv`
    fn set_with(dr: &[f64], dv: &[f64]) -> AlignedSet {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let records = dr
            .iter()
            .zip(dv)
            .enumerate()
            .map(|(i, (&r, &v))| AlignedRecord {
                date: start + Duration::days(i as i64 * 5),
                r_truth: 2.5,
                v_truth: 0.01,
                r_simulated: 2.5 + r,
                v_simulated: 0.01 + v,
                r_analytic: 2.5,
                v_analytic: 0.01,
            })
            .collect();
        AlignedSet {
            object: "433_Eros".to_string(),
            records,
        }
    }

    #[test]
    fn test_constant_deviation_never_flags() {
        let set = set_with(&[0.2; 12], &[0.001; 12]);
        let report = AnomalyDetector::default().detect(&set, Model::Simulated);

        assert!(report.records.iter().all(|r| r.z_score == 0.0 && !r.anomaly));
        let summary = report.summary;
        assert_eq!(summary.anomaly_count, 0);
        assert_eq!(summary.dominant_error_mode, ErrorMode::None);
        assert_eq!(summary.temporal_behavior, TemporalBehavior::None);
        assert_eq!(summary.stability_class, StabilityClass::Stable);
        assert_eq!(summary.physical_interpretation, "Consistent with reference ephemeris");
        assert!((summary.mean_delta_r - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_single_position_spike() {
        let mut dr = vec![0.1; 12];
        dr[6] = 1.0;
        let set = set_with(&dr, &[0.001; 12]);
        let report = AnomalyDetector::default().detect(&set, Model::Simulated);

        let flagged: Vec<usize> = report
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.anomaly)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flagged, vec![6]);

        // one outlier among n = 12 scores (n - 1) / sqrt(n) ≈ 3.175
        let spike = &report.records[6];
        assert!((spike.z_r - 11.0 / 12f64.sqrt()).abs() < 1e-6);
        assert_eq!(spike.z_v, 0.0);

        let summary = report.summary;
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.position_dominated_anomalies, 1);
        assert_eq!(summary.velocity_dominated_anomalies, 0);
        assert_eq!(summary.dominant_error_mode, ErrorMode::Position);
        assert_eq!(summary.temporal_behavior, TemporalBehavior::Isolated);
        assert_eq!(summary.stability_class, StabilityClass::MarginallyStable);
        assert_eq!(summary.physical_interpretation, "Long-term orbital geometry deviation");
    }

    #[test]
    fn test_large_history_spike_is_unstable() {
        let mut dv = vec![0.001; 30];
        dv[20] = 0.5;
        let set = set_with(&[0.1; 30], &dv);
        let summary = AnomalyDetector::default().detect(&set, Model::Simulated).summary;

        // (n - 1) / sqrt(n) for n = 30 is above 4
        assert!(summary.max_z_score >= 4.0);
        assert_eq!(summary.stability_class, StabilityClass::Unstable);
        assert_eq!(summary.dominant_error_mode, ErrorMode::Velocity);
        assert_eq!(summary.physical_interpretation, "Short-term dynamical instability");
    }

    #[test]
    fn test_persistent_and_threshold_inclusive() {
        let mut dr = vec![0.1; 12];
        dr[6] = 1.0;
        let set = set_with(&dr, &[0.001; 12]);
        let spike_z = AnomalyDetector::default().detect(&set, Model::Simulated).records[6].z_score;

        // a score equal to the threshold is anomalous
        let detector = AnomalyDetector::new(AnomalyThresholds {
            z_threshold: spike_z,
            persistent_min_count: 1,
            unstable_z: 10.0,
        });
        let summary = detector.detect(&set, Model::Simulated).summary;
        assert_eq!(summary.anomaly_count, 1);
        assert_eq!(summary.temporal_behavior, TemporalBehavior::Persistent);

        let detector = AnomalyDetector::new(AnomalyThresholds {
            z_threshold: 0.1,
            persistent_min_count: 3,
            unstable_z: 10.0,
        });
        let summary = detector.detect(&set, Model::Simulated).summary;
        // every record sits at least 0.1 std from the mean
        assert_eq!(summary.anomaly_count, 12);
        assert_eq!(summary.temporal_behavior, TemporalBehavior::Persistent);
    }

    #[test]
    fn test_velocity_wins_ties() {
        let mut dr = vec![0.1; 12];
        let mut dv = vec![0.001; 12];
        dr[2] = 1.0;
        dv[9] = 0.01;
        let set = set_with(&dr, &dv);
        let summary = AnomalyDetector::default().detect(&set, Model::Simulated).summary;

        assert_eq!(summary.position_dominated_anomalies, 1);
        assert_eq!(summary.velocity_dominated_anomalies, 1);
        assert_eq!(summary.dominant_error_mode, ErrorMode::Velocity);
    }
}
