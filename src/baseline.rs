//! Deviation baselines
//!
//! Summary statistics of a deviation channel over an object's entire
//! aligned history. Baselines give the local reference that anomaly scores
//! and volatility are measured against.

/// Mean and sample standard deviation of one deviation channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBaseline {
    pub mean: f64,
    pub std: f64,
}

impl ChannelBaseline {
    /// Compute the baseline of a full history
    pub fn from_values(values: &[f64]) -> Self {
        let mean = mean(values).unwrap_or(0.0);
        Self {
            mean,
            std: sample_std(values, mean),
        }
    }

    /// Distance of a value from the baseline mean in standard deviations.
    ///
    /// Zero when the history has no variance.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean).abs() / self.std
        } else {
            0.0
        }
    }

    /// Coefficient of variation (std / mean).
    ///
    /// Zero for a history without dispersion. A zero mean with nonzero
    /// dispersion yields a non-finite value.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            self.std / self.mean
        }
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Sample standard deviation (n - 1); zero below two values or for a
/// constant series
pub fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let scale = max_abs(values.iter().map(|v| v - mean));
    let sum_sq: f64 = values.iter().map(|v| ((v - mean) / scale).powi(2)).sum();
    scale * (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Largest absolute value, 0 for an empty iterator.
///
/// Sums of squares divide by this first so large deviations cannot overflow.
pub fn max_abs(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().map(f64::abs).fold(0.0, f64::max)
}

/// True when every value equals the first.
///
/// The mean of identical values can miss them by an ulp, so dispersion
/// checks compare the values directly.
pub fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}
