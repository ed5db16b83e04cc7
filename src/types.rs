//! Core types for the Orbit Divergence pipeline
//!
//! This module defines the records that flow through each stage of the
//! pipeline: trajectory series, aligned records, deviation metrics, anomaly
//! records, and the flat summary rows written for downstream consumers.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Producer of a trajectory series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Reference ephemeris, assumed authoritative
    GroundTruth,
    /// Numerically integrated trajectory
    Simulated,
    /// Closed-form propagation
    Analytic,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::GroundTruth, Source::Simulated, Source::Analytic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::GroundTruth => "ground_truth",
            Source::Simulated => "simulated",
            Source::Analytic => "analytic",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trajectory model compared against ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    Simulated,
    Analytic,
}

impl Model {
    pub const ALL: [Model; 2] = [Model::Simulated, Model::Analytic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Simulated => "simulated",
            Model::Analytic => "analytic",
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Model::Simulated => Source::Simulated,
            Model::Analytic => Source::Analytic,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar magnitude tracked per trajectory point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Position,
    Velocity,
}

/// A timestamped physical state reduced to scalar magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Calendar day (no time-of-day resolution)
    pub date: NaiveDate,
    /// Distance from the reference body
    pub position_magnitude: f64,
    /// Speed relative to the reference body
    pub velocity_magnitude: f64,
}

impl TrajectoryPoint {
    /// Build a point from cartesian position and velocity components
    pub fn from_state(date: NaiveDate, position: [f64; 3], velocity: [f64; 3]) -> Self {
        Self {
            date,
            position_magnitude: magnitude(position),
            velocity_magnitude: magnitude(velocity),
        }
    }
}

/// Euclidean norm of a 3-vector, without overflow in the squares
pub fn magnitude(v: [f64; 3]) -> f64 {
    v[0].hypot(v[1]).hypot(v[2])
}

/// Date-ordered trajectory for one (object, source) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySeries {
    pub object: String,
    pub source: Source,
    points: Vec<TrajectoryPoint>,
}

impl TrajectorySeries {
    /// Build a series from points in any order.
    ///
    /// Points are ordered by date. When a date repeats, the point read last
    /// replaces the earlier ones.
    pub fn new(object: impl Into<String>, source: Source, points: Vec<TrajectoryPoint>) -> Self {
        let mut by_date = std::collections::BTreeMap::new();
        for point in points {
            by_date.insert(point.date, point);
        }
        Self {
            object: object.into(),
            source,
            points: by_date.into_values().collect(),
        }
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One calendar date present in all three sources
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub date: NaiveDate,
    pub r_truth: f64,
    pub v_truth: f64,
    pub r_simulated: f64,
    pub v_simulated: f64,
    pub r_analytic: f64,
    pub v_analytic: f64,
}

impl AlignedRecord {
    /// Model value for a channel
    pub fn value(&self, model: Model, channel: Channel) -> f64 {
        match (model, channel) {
            (Model::Simulated, Channel::Position) => self.r_simulated,
            (Model::Simulated, Channel::Velocity) => self.v_simulated,
            (Model::Analytic, Channel::Position) => self.r_analytic,
            (Model::Analytic, Channel::Velocity) => self.v_analytic,
        }
    }

    /// Ground-truth value for a channel
    pub fn truth(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Position => self.r_truth,
            Channel::Velocity => self.v_truth,
        }
    }

    /// Absolute deviation of a model from ground truth
    pub fn deviation(&self, model: Model, channel: Channel) -> f64 {
        (self.value(model, channel) - self.truth(channel)).abs()
    }
}

/// Aligned rows for one object, date-ordered, at least the minimum sample size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSet {
    pub object: String,
    pub records: Vec<AlignedRecord>,
}

/// Per-record absolute deviations for one (object, model, channel)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationSeries {
    pub model: Model,
    pub channel: Channel,
    pub values: Vec<f64>,
}

/// Compact reduction of a deviation series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTuple {
    /// Root-mean-square deviation
    pub rms: f64,
    /// OLS slope of deviation against step index
    pub slope: f64,
    /// OLS intercept of deviation against step index
    pub intercept: f64,
    /// Coefficient of determination of the linear fit
    pub r_squared: f64,
    /// last / first, 1 when the first deviation is zero
    pub endpoint_ratio: f64,
    /// Sample std / mean
    pub volatility: f64,
}

/// Qualitative long-horizon behavior of a model's positional error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorClass {
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Linear Drift")]
    LinearDrift,
    #[serde(rename = "Oscillatory")]
    Oscillatory,
    #[serde(rename = "Runaway Divergence")]
    RunawayDivergence,
    #[serde(rename = "Mixed")]
    Mixed,
}

impl BehaviorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorClass::Stable => "Stable",
            BehaviorClass::LinearDrift => "Linear Drift",
            BehaviorClass::Oscillatory => "Oscillatory",
            BehaviorClass::RunawayDivergence => "Runaway Divergence",
            BehaviorClass::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of the detailed aligned + deviation table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedRow {
    pub date: NaiveDate,
    pub r_truth: f64,
    pub v_truth: f64,
    pub r_simulated: f64,
    pub v_simulated: f64,
    pub r_analytic: f64,
    pub v_analytic: f64,
    pub delta_r_simulated: f64,
    pub delta_v_simulated: f64,
    pub delta_r_analytic: f64,
    pub delta_v_analytic: f64,
}

impl From<&AlignedRecord> for DetailedRow {
    fn from(record: &AlignedRecord) -> Self {
        Self {
            date: record.date,
            r_truth: record.r_truth,
            v_truth: record.v_truth,
            r_simulated: record.r_simulated,
            v_simulated: record.v_simulated,
            r_analytic: record.r_analytic,
            v_analytic: record.v_analytic,
            delta_r_simulated: record.deviation(Model::Simulated, Channel::Position),
            delta_v_simulated: record.deviation(Model::Simulated, Channel::Velocity),
            delta_r_analytic: record.deviation(Model::Analytic, Channel::Position),
            delta_v_analytic: record.deviation(Model::Analytic, Channel::Velocity),
        }
    }
}

/// Per (object, model) metrics-and-classification summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub object: String,
    pub model: Model,
    pub samples: usize,
    pub rms_error: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub ratio: f64,
    pub volatility: f64,
    pub behavior_class: BehaviorClass,
}

/// One row per object with both models side by side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRow {
    pub object: String,
    pub simulated_rms_error: f64,
    pub analytic_rms_error: f64,
    pub simulated_ratio: f64,
    pub analytic_ratio: f64,
    pub simulated_volatility: f64,
    pub analytic_volatility: f64,
    pub simulated_class: BehaviorClass,
    pub analytic_class: BehaviorClass,
    /// Model with the strictly lower RMS error; `analytic` only when strictly lower
    pub better_model: Model,
}

/// Per-record anomaly scores for one (object, model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub delta_r: f64,
    pub delta_v: f64,
    pub z_r: f64,
    pub z_v: f64,
    pub z_score: f64,
    pub anomaly: bool,
}

/// Which channel dominates a model's anomalies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorMode {
    None,
    Position,
    Velocity,
}

impl ErrorMode {
    pub fn interpretation(&self) -> &'static str {
        match self {
            ErrorMode::Position => "Long-term orbital geometry deviation",
            ErrorMode::Velocity => "Short-term dynamical instability",
            ErrorMode::None => "Consistent with reference ephemeris",
        }
    }
}

/// How anomalies are spread through time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalBehavior {
    None,
    Isolated,
    Persistent,
}

/// Anomaly-based stability label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityClass {
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Marginally Stable")]
    MarginallyStable,
    #[serde(rename = "Unstable")]
    Unstable,
}

/// Per (object, model) anomaly-and-explainability summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub object: String,
    pub model: Model,
    pub samples: usize,
    pub mean_delta_r: f64,
    pub mean_delta_v: f64,
    pub max_z_score: f64,
    pub anomaly_count: usize,
    pub velocity_dominated_anomalies: usize,
    pub position_dominated_anomalies: usize,
    pub dominant_error_mode: ErrorMode,
    pub temporal_behavior: TemporalBehavior,
    pub physical_interpretation: String,
    pub stability_class: StabilityClass,
}

/// Minimal per-object error summary accepted by the comparator.
///
/// Extra columns in a prior summary table are ignored; the optional
/// anomaly columns pass through to the comparison row when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelErrorSummary {
    pub object: String,
    pub mean_delta_r: f64,
    pub mean_delta_v: f64,
    #[serde(default)]
    pub max_z_score: Option<f64>,
    #[serde(default)]
    pub anomaly_count: Option<usize>,
    #[serde(default)]
    pub stability_class: Option<StabilityClass>,
}

impl From<&AnomalySummary> for ModelErrorSummary {
    fn from(summary: &AnomalySummary) -> Self {
        Self {
            object: summary.object.clone(),
            mean_delta_r: summary.mean_delta_r,
            mean_delta_v: summary.mean_delta_v,
            max_z_score: Some(summary.max_z_score),
            anomaly_count: Some(summary.anomaly_count),
            stability_class: Some(summary.stability_class),
        }
    }
}

/// Percentage improvement of model B over model A.
///
/// `Undefined` when model A's error is zero; serialized as the literal
/// `undefined` so it is never mistaken for a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Improvement {
    Percent(f64),
    Undefined,
}

impl Improvement {
    pub const UNDEFINED_MARKER: &'static str = "undefined";

    pub fn percent(&self) -> Option<f64> {
        match self {
            Improvement::Percent(p) => Some(*p),
            Improvement::Undefined => None,
        }
    }
}

impl fmt::Display for Improvement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Improvement::Percent(p) => write!(f, "{p}"),
            Improvement::Undefined => f.write_str(Self::UNDEFINED_MARKER),
        }
    }
}

impl Serialize for Improvement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Improvement::Percent(p) => serializer.serialize_f64(*p),
            Improvement::Undefined => serializer.serialize_str(Self::UNDEFINED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Improvement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(p) => Ok(Improvement::Percent(p)),
            Raw::Text(text) if text == Self::UNDEFINED_MARKER => Ok(Improvement::Undefined),
            Raw::Text(text) => text
                .parse::<f64>()
                .map(Improvement::Percent)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Which of two compared models has less error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    A,
    B,
    Equal,
}

/// Per-object cross-model comparison row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub object: String,
    pub model_a_mean_delta_r: f64,
    pub model_b_mean_delta_r: f64,
    pub model_a_mean_delta_v: f64,
    pub model_b_mean_delta_v: f64,
    /// A − B radial error; positive favors B
    pub delta_mean_r_difference: f64,
    /// A − B velocity error; positive favors B
    pub delta_mean_v_difference: f64,
    pub r_improvement_percent: Improvement,
    pub v_improvement_percent: Improvement,
    pub better_model_radial: Verdict,
    pub better_model_velocity: Verdict,
    pub model_a_max_z: Option<f64>,
    pub model_b_max_z: Option<f64>,
    pub model_a_anomaly_count: Option<usize>,
    pub model_b_anomaly_count: Option<usize>,
    pub model_a_stability_class: Option<StabilityClass>,
    pub model_b_stability_class: Option<StabilityClass>,
}

/// Aggregate scalars over all compared objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonAggregate {
    pub model_a: String,
    pub model_b: String,
    pub objects_compared: usize,
    pub mean_error_a_radial: f64,
    pub mean_error_b_radial: f64,
    pub mean_error_a_velocity: f64,
    pub mean_error_b_velocity: f64,
    /// `B` only when B's mean radial error is strictly lower
    pub overall_winner: Verdict,
    pub overall_winner_label: String,
}

/// Object left out of a batch and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedObject {
    pub object: String,
    pub reason: crate::error::SkipReason,
    pub detail: String,
}
