//! Behavior classification
//!
//! Maps a metric tuple to a [`BehaviorClass`] with ordered threshold rules.
//! The first rule that matches wins.

use crate::config::ClassifierThresholds;
use crate::types::{BehaviorClass, MetricTuple};

/// Classify positional error behavior from (ratio, volatility, r²).
///
/// Non-finite inputs fail every comparison they appear in, so the function
/// is total: NaN falls through to `Mixed`, an infinite ratio to
/// `Runaway Divergence`.
pub fn classify(
    ratio: f64,
    volatility: f64,
    r_squared: f64,
    thresholds: &ClassifierThresholds,
) -> BehaviorClass {
    if ratio < thresholds.stable_max_ratio && volatility < thresholds.stable_max_volatility {
        BehaviorClass::Stable
    } else if ratio < thresholds.divergence_ratio && r_squared > thresholds.drift_min_r_squared {
        BehaviorClass::LinearDrift
    } else if volatility > thresholds.oscillatory_min_volatility {
        BehaviorClass::Oscillatory
    } else if ratio >= thresholds.divergence_ratio {
        BehaviorClass::RunawayDivergence
    } else {
        BehaviorClass::Mixed
    }
}

/// Classifier bound to a threshold set
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorClassifier {
    thresholds: ClassifierThresholds,
}

impl BehaviorClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, metrics: &MetricTuple) -> BehaviorClass {
        classify(
            metrics.endpoint_ratio,
            metrics.volatility,
            metrics.r_squared,
            &self.thresholds,
        )
    }
}
