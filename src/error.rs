//! Error types for Orbit Divergence

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::Source;

/// Errors that can occur while loading or analyzing trajectories
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing source {series} for object {object}")]
    MissingSource { object: String, series: Source },

    #[error("Schema mismatch in {series} for object {object}: {detail}")]
    SchemaMismatch {
        object: String,
        series: Source,
        detail: String,
    },

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid object name '{0}': names must not contain path separators")]
    InvalidObjectName(String),

    #[error("Insufficient aligned samples for {object}: {found} < {required}")]
    InsufficientSamples {
        object: String,
        found: usize,
        required: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Why an object was left out of a batch.
///
/// Skips are an expected outcome, not a failure of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingSource,
    SchemaMismatch,
    InsufficientSamples,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingSource => "missing_source",
            SkipReason::SchemaMismatch => "schema_mismatch",
            SkipReason::InsufficientSamples => "insufficient_samples",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AnalysisError {
    /// Map a per-object error onto the batch skip taxonomy.
    ///
    /// Unreadable files count as a missing source; anything that fails to
    /// parse counts as a schema mismatch.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            AnalysisError::MissingSource { .. }
            | AnalysisError::InvalidObjectName(_)
            | AnalysisError::Io(_) => SkipReason::MissingSource,
            AnalysisError::InsufficientSamples { .. } => SkipReason::InsufficientSamples,
            AnalysisError::SchemaMismatch { .. }
            | AnalysisError::DateParseError(_)
            | AnalysisError::Csv(_)
            | AnalysisError::JsonError(_)
            | AnalysisError::InvalidConfig(_) => SkipReason::SchemaMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_mapping() {
        let missing = AnalysisError::MissingSource {
            object: "1_Ceres".to_string(),
            series: Source::GroundTruth,
        };
        assert_eq!(missing.skip_reason(), SkipReason::MissingSource);

        let short = AnalysisError::InsufficientSamples {
            object: "1_Ceres".to_string(),
            found: 4,
            required: 10,
        };
        assert_eq!(short.skip_reason(), SkipReason::InsufficientSamples);

        let escaping = AnalysisError::InvalidObjectName("../1_Ceres".to_string());
        assert_eq!(escaping.skip_reason(), SkipReason::MissingSource);

        let bad_date = AnalysisError::DateParseError("A.D. 2025-Foo-01".to_string());
        assert_eq!(bad_date.skip_reason(), SkipReason::SchemaMismatch);
    }

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::MissingSource {
            object: "4_Vesta".to_string(),
            series: Source::Analytic,
        };
        assert_eq!(err.to_string(), "Missing source analytic for object 4_Vesta");
        assert_eq!(SkipReason::InsufficientSamples.to_string(), "insufficient_samples");
    }
}
