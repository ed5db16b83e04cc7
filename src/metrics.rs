//! Deviation metrics
//!
//! This module reduces a model's deviation from ground truth to a
//! [`MetricTuple`]:
//! - RMS error
//! - Linear trend (slope, intercept, R²) against the step index
//! - Endpoint growth ratio and volatility

use crate::baseline::{is_constant, max_abs, mean, ChannelBaseline};
use crate::types::{AlignedSet, Channel, DeviationSeries, MetricTuple, Model};

/// Absolute deviation of a model from ground truth, one value per aligned record
pub fn deviation_series(set: &AlignedSet, model: Model, channel: Channel) -> DeviationSeries {
    DeviationSeries {
        model,
        channel,
        values: set
            .records
            .iter()
            .map(|record| record.deviation(model, channel))
            .collect(),
    }
}

/// Reduce a deviation series to its metric tuple
pub fn compute_metrics(deviations: &[f64]) -> MetricTuple {
    let (slope, intercept, r_squared) = linear_fit(deviations);

    MetricTuple {
        rms: rms(deviations),
        slope,
        intercept,
        r_squared,
        endpoint_ratio: endpoint_ratio(deviations),
        volatility: volatility(deviations),
    }
}

/// Computes metric tuples for each model of an aligned set
pub struct MetricsEngine;

impl MetricsEngine {
    /// Metrics for one model, always from the position channel
    pub fn compute(set: &AlignedSet, model: Model) -> MetricTuple {
        let deviations = deviation_series(set, model, Channel::Position);
        compute_metrics(&deviations.values)
    }
}

/// Root-mean-square of the values, 0 for an empty slice
fn rms(values: &[f64]) -> f64 {
    let scale = max_abs(values.iter().copied());
    if scale == 0.0 {
        return 0.0;
    }
    let squares: Vec<f64> = values.iter().map(|v| (v / scale).powi(2)).collect();
    mean(&squares).map_or(0.0, |m| scale * m.sqrt())
}

/// Ordinary least squares of values against 0, 1, 2, ...
///
/// Returns (slope, intercept, r²). With fewer than two points or no variance
/// in the values, slope and r² are 0 and the intercept is the mean.
fn linear_fit(values: &[f64]) -> (f64, f64, f64) {
    let Some(y_mean) = mean(values) else {
        return (0.0, 0.0, 0.0);
    };
    let n = values.len();
    if n < 2 || is_constant(values) {
        return (0.0, y_mean, 0.0);
    }

    // fit in units of the largest deviation, then scale the slope back
    let scale = max_abs(values.iter().map(|y| y - y_mean));
    let x_mean = (n - 1) as f64 / 2.0;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = (y - y_mean) / scale;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if syy == 0.0 {
        return (0.0, y_mean, 0.0);
    }

    let slope = sxy / sxx * scale;
    let intercept = y_mean - slope * x_mean;
    let r_squared = (sxy * sxy) / (sxx * syy);
    (slope, intercept, r_squared)
}

/// last / first; 1 when the first deviation is zero
fn endpoint_ratio(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => last / first,
        _ => 1.0,
    }
}

/// Sample std / mean; 0 when there is no dispersion
fn volatility(values: &[f64]) -> f64 {
    ChannelBaseline::from_values(values).coefficient_of_variation()
}
