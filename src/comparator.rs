//! Cross-model comparison
//!
//! Joins two per-object error summaries on the object identifier and ranks
//! the models per object and in aggregate. Model A is the reference that
//! improvement percentages are measured against.

use crate::types::{
    ComparisonAggregate, ComparisonRecord, Improvement, ModelErrorSummary, Verdict,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-object rows and the aggregate verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub records: Vec<ComparisonRecord>,
    /// `None` when no object appears in both tables
    pub aggregate: Option<ComparisonAggregate>,
}

/// Compares two named models' error summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelComparator {
    model_a: String,
    model_b: String,
}

impl Default for ModelComparator {
    fn default() -> Self {
        Self::new("A", "B")
    }
}

impl ModelComparator {
    pub fn new(model_a: impl Into<String>, model_b: impl Into<String>) -> Self {
        Self {
            model_a: model_a.into(),
            model_b: model_b.into(),
        }
    }

    pub fn model_a(&self) -> &str {
        &self.model_a
    }

    pub fn model_b(&self) -> &str {
        &self.model_b
    }

    /// Compare two summary tables.
    ///
    /// Objects present in only one table are dropped. Rows come out ordered
    /// by object. When an object repeats within a table the later row wins.
    pub fn compare(
        &self,
        table_a: &[ModelErrorSummary],
        table_b: &[ModelErrorSummary],
    ) -> ComparisonReport {
        let b_by_object: BTreeMap<&str, &ModelErrorSummary> =
            table_b.iter().map(|s| (s.object.as_str(), s)).collect();
        let a_by_object: BTreeMap<&str, &ModelErrorSummary> =
            table_a.iter().map(|s| (s.object.as_str(), s)).collect();

        let records: Vec<ComparisonRecord> = a_by_object
            .into_iter()
            .filter_map(|(object, a)| b_by_object.get(object).map(|b| compare_pair(a, b)))
            .collect();

        let aggregate = self.aggregate(&records);
        ComparisonReport { records, aggregate }
    }

    fn aggregate(&self, records: &[ComparisonRecord]) -> Option<ComparisonAggregate> {
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        let avg = |f: fn(&ComparisonRecord) -> f64| records.iter().map(f).sum::<f64>() / n;

        let mean_error_a_radial = avg(|r| r.model_a_mean_delta_r);
        let mean_error_b_radial = avg(|r| r.model_b_mean_delta_r);
        let overall_winner = if mean_error_b_radial < mean_error_a_radial {
            Verdict::B
        } else {
            Verdict::A
        };
        let overall_winner_label = match overall_winner {
            Verdict::B => self.model_b.clone(),
            _ => self.model_a.clone(),
        };

        Some(ComparisonAggregate {
            model_a: self.model_a.clone(),
            model_b: self.model_b.clone(),
            objects_compared: records.len(),
            mean_error_a_radial,
            mean_error_b_radial,
            mean_error_a_velocity: avg(|r| r.model_a_mean_delta_v),
            mean_error_b_velocity: avg(|r| r.model_b_mean_delta_v),
            overall_winner,
            overall_winner_label,
        })
    }
}

fn compare_pair(a: &ModelErrorSummary, b: &ModelErrorSummary) -> ComparisonRecord {
    ComparisonRecord {
        object: a.object.clone(),
        model_a_mean_delta_r: a.mean_delta_r,
        model_b_mean_delta_r: b.mean_delta_r,
        model_a_mean_delta_v: a.mean_delta_v,
        model_b_mean_delta_v: b.mean_delta_v,
        delta_mean_r_difference: a.mean_delta_r - b.mean_delta_r,
        delta_mean_v_difference: a.mean_delta_v - b.mean_delta_v,
        r_improvement_percent: improvement(a.mean_delta_r, b.mean_delta_r),
        v_improvement_percent: improvement(a.mean_delta_v, b.mean_delta_v),
        better_model_radial: verdict(a.mean_delta_r, b.mean_delta_r),
        better_model_velocity: verdict(a.mean_delta_v, b.mean_delta_v),
        model_a_max_z: a.max_z_score,
        model_b_max_z: b.max_z_score,
        model_a_anomaly_count: a.anomaly_count,
        model_b_anomaly_count: b.anomaly_count,
        model_a_stability_class: a.stability_class,
        model_b_stability_class: b.stability_class,
    }
}

/// Improvement of B over A as a percentage of A's error
pub fn improvement(error_a: f64, error_b: f64) -> Improvement {
    if error_a == 0.0 {
        Improvement::Undefined
    } else {
        Improvement::Percent((error_a - error_b) / error_a * 100.0)
    }
}

/// Model with the strictly lower error, `Equal` on exact ties
pub fn verdict(error_a: f64, error_b: f64) -> Verdict {
    if error_b < error_a {
        Verdict::B
    } else if error_a < error_b {
        Verdict::A
    } else {
        Verdict::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StabilityClass;
    use pretty_assertions::assert_eq;

    fn summary(object: &str, r: f64, v: f64) -> ModelErrorSummary {
        ModelErrorSummary {
            object: object.to_string(),
            mean_delta_r: r,
            mean_delta_v: v,
            max_z_score: None,
            anomaly_count: None,
            stability_class: None,
        }
    }

    #[test]
    fn test_b_better_on_single_object() {
        let report = ModelComparator::default()
            .compare(&[summary("A", 0.10, 0.002)], &[summary("A", 0.08, 0.002)]);

        assert_eq!(report.records.len(), 1);
        let row = &report.records[0];
        assert_eq!(row.better_model_radial, Verdict::B);
        assert!((row.delta_mean_r_difference - 0.02).abs() < 1e-12);
        let pct = row.r_improvement_percent.percent().unwrap();
        assert!((pct - 20.0).abs() < 1e-9);
        assert_eq!(row.better_model_velocity, Verdict::Equal);
        assert_eq!(row.v_improvement_percent, Improvement::Percent(0.0));
    }

    #[test]
    fn test_zero_reference_error_is_undefined() {
        let report = ModelComparator::default()
            .compare(&[summary("X", 0.0, 0.0)], &[summary("X", 0.05, 0.0)]);
        let row = &report.records[0];
        assert_eq!(row.r_improvement_percent, Improvement::Undefined);
        assert_eq!(row.v_improvement_percent, Improvement::Undefined);
        assert_eq!(row.better_model_radial, Verdict::A);
    }

    #[test]
    fn test_inner_join_and_ordering() {
        let a = vec![summary("b", 1.0, 1.0), summary("a", 1.0, 1.0), summary("only_a", 1.0, 1.0)];
        let b = vec![summary("only_b", 1.0, 1.0), summary("a", 2.0, 0.5), summary("b", 0.5, 2.0)];
        let report = ModelComparator::default().compare(&a, &b);

        let objects: Vec<&str> = report.records.iter().map(|r| r.object.as_str()).collect();
        assert_eq!(objects, vec!["a", "b"]);
        assert_eq!(report.records[0].better_model_radial, Verdict::A);
        assert_eq!(report.records[0].better_model_velocity, Verdict::B);
    }

    #[test]
    fn test_aggregate_winner() {
        let comparator = ModelComparator::new("analytic", "simulated");
        let a = vec![summary("1_Ceres", 0.10, 0.01), summary("4_Vesta", 0.30, 0.02)];
        let b = vec![summary("1_Ceres", 0.05, 0.01), summary("4_Vesta", 0.25, 0.03)];
        let aggregate = comparator.compare(&a, &b).aggregate.unwrap();

        assert_eq!(aggregate.objects_compared, 2);
        assert!((aggregate.mean_error_a_radial - 0.20).abs() < 1e-12);
        assert!((aggregate.mean_error_b_radial - 0.15).abs() < 1e-12);
        assert_eq!(aggregate.overall_winner, Verdict::B);
        assert_eq!(aggregate.overall_winner_label, "simulated");
    }

    #[test]
    fn test_aggregate_tie_goes_to_a() {
        let a = vec![summary("x", 0.1, 0.1)];
        let b = vec![summary("x", 0.1, 0.0)];
        let aggregate = ModelComparator::default().compare(&a, &b).aggregate.unwrap();
        assert_eq!(aggregate.overall_winner, Verdict::A);
        assert_eq!(aggregate.overall_winner_label, "A");
    }

    #[test]
    fn test_empty_join_has_no_aggregate() {
        let report = ModelComparator::default()
            .compare(&[summary("x", 0.1, 0.1)], &[summary("y", 0.1, 0.1)]);
        assert!(report.records.is_empty());
        assert_eq!(report.aggregate, None);
    }

    #[test]
    fn test_anomaly_columns_pass_through() {
        let mut a = summary("x", 0.1, 0.1);
        a.max_z_score = Some(3.2);
        a.anomaly_count = Some(2);
        a.stability_class = Some(StabilityClass::MarginallyStable);
        let report = ModelComparator::default().compare(&[a], &[summary("x", 0.2, 0.2)]);

        let row = &report.records[0];
        assert_eq!(row.model_a_max_z, Some(3.2));
        assert_eq!(row.model_a_anomaly_count, Some(2));
        assert_eq!(row.model_a_stability_class, Some(StabilityClass::MarginallyStable));
        assert_eq!(row.model_b_max_z, None);
    }
}
