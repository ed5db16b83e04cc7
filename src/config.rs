//! Analysis configuration
//!
//! Every tunable the pipeline uses lives in an explicit [`AnalysisConfig`]
//! value that is passed into each stage. Defaults reproduce the reference
//! thresholds.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Minimum aligned rows for an object to be analyzed
pub const DEFAULT_MIN_ALIGNED_ROWS: usize = 10;

/// Thresholds for the ordered behavior rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Stable requires ratio below this
    pub stable_max_ratio: f64,
    /// Stable requires volatility below this
    pub stable_max_volatility: f64,
    /// Linear drift requires ratio below this; runaway divergence at or above it
    pub divergence_ratio: f64,
    /// Linear drift requires R² above this
    pub drift_min_r_squared: f64,
    /// Oscillatory requires volatility above this
    pub oscillatory_min_volatility: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            stable_max_ratio: 1.5,
            stable_max_volatility: 0.5,
            divergence_ratio: 3.0,
            drift_min_r_squared: 0.7,
            oscillatory_min_volatility: 1.0,
        }
    }
}

/// Thresholds for local anomaly scoring and explainability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// A record is anomalous when its score meets or exceeds this
    pub z_threshold: f64,
    /// Anomaly count at which behavior is persistent rather than isolated
    pub persistent_min_count: usize,
    /// Max score at which an anomalous object is unstable
    pub unstable_z: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            z_threshold: 2.5,
            persistent_min_count: 3,
            unstable_z: 4.0,
        }
    }
}

/// Where the three source series live on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    pub ground_truth_dir: PathBuf,
    pub simulated_dir: PathBuf,
    pub analytic_dir: PathBuf,
    pub ground_truth_suffix: String,
    pub simulated_suffix: String,
    pub analytic_suffix: String,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            ground_truth_dir: PathBuf::from("results/real"),
            simulated_dir: PathBuf::from("results/rebound"),
            analytic_dir: PathBuf::from("results/manual"),
            ground_truth_suffix: "_Real.csv".to_string(),
            simulated_suffix: "_Rebound.csv".to_string(),
            analytic_suffix: ".csv".to_string(),
        }
    }
}

impl SourceLayout {
    /// Layout with all three sources under one root, using the default
    /// subdirectory names and suffixes
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            ground_truth_dir: root.join("real"),
            simulated_dir: root.join("rebound"),
            analytic_dir: root.join("manual"),
            ..Self::default()
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_aligned_rows: usize,
    pub classifier: ClassifierThresholds,
    pub anomaly: AnomalyThresholds,
    pub layout: SourceLayout,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_aligned_rows: DEFAULT_MIN_ALIGNED_ROWS,
            classifier: ClassifierThresholds::default(),
            anomaly: AnomalyThresholds::default(),
            layout: SourceLayout::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make downstream statistics meaningless
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_aligned_rows < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_aligned_rows must be at least 2, got {}",
                self.min_aligned_rows
            )));
        }
        if !(self.anomaly.z_threshold.is_finite() && self.anomaly.z_threshold > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "anomaly.z_threshold must be positive, got {}",
                self.anomaly.z_threshold
            )));
        }
        if !(self.anomaly.unstable_z.is_finite() && self.anomaly.unstable_z > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "anomaly.unstable_z must be positive, got {}",
                self.anomaly.unstable_z
            )));
        }
        let classifier = &self.classifier;
        for (name, value) in [
            ("stable_max_ratio", classifier.stable_max_ratio),
            ("stable_max_volatility", classifier.stable_max_volatility),
            ("divergence_ratio", classifier.divergence_ratio),
            ("drift_min_r_squared", classifier.drift_min_r_squared),
            ("oscillatory_min_volatility", classifier.oscillatory_min_volatility),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "classifier.{name} must be finite, got {value}"
                )));
            }
        }
        if self.anomaly.persistent_min_count == 0 {
            return Err(AnalysisError::InvalidConfig(
                "anomaly.persistent_min_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
