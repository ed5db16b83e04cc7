//! Pipeline orchestration
//!
//! This module provides the public API for Orbit Divergence.
//! It runs each object through alignment, metrics, classification, and
//! anomaly scoring, and collects the outcomes into a [`BatchResult`].

use crate::align::align;
use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::classifier::BehaviorClassifier;
use crate::comparator::{ComparisonReport, ModelComparator};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::loader::{check_object_name, TrajectorySource};
use crate::metrics::MetricsEngine;
use crate::types::{
    AlignedSet, AnomalySummary, DetailedRow, MetricsRow, Model, ModelErrorSummary, SkippedObject,
    Source, UnifiedRow,
};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Everything computed for one analyzed object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectReport {
    pub object: String,
    pub detailed: Vec<DetailedRow>,
    /// One row per model, simulated first
    pub metrics: Vec<MetricsRow>,
    pub unified: UnifiedRow,
    pub simulated_anomalies: AnomalyReport,
    pub analytic_anomalies: AnomalyReport,
}

impl ObjectReport {
    pub fn anomalies(&self, model: Model) -> &AnomalyReport {
        match model {
            Model::Simulated => &self.simulated_anomalies,
            Model::Analytic => &self.analytic_anomalies,
        }
    }
}

/// Result of running one object through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectOutcome {
    Analyzed(Box<ObjectReport>),
    Skipped(SkippedObject),
}

impl ObjectOutcome {
    pub fn object(&self) -> &str {
        match self {
            ObjectOutcome::Analyzed(report) => &report.object,
            ObjectOutcome::Skipped(skipped) => &skipped.object,
        }
    }
}

/// Load, align, and analyze one object.
///
/// Every failure becomes a skip with its reason; nothing here aborts a batch.
pub fn analyze_object(
    source: &dyn TrajectorySource,
    object: &str,
    config: &AnalysisConfig,
) -> ObjectOutcome {
    match load_and_align(source, object, config) {
        Ok(set) => ObjectOutcome::Analyzed(Box::new(analyze_aligned(&set, config))),
        Err(err) => {
            warn!(object, reason = %err.skip_reason(), "skipping object: {err}");
            ObjectOutcome::Skipped(SkippedObject {
                object: object.to_string(),
                reason: err.skip_reason(),
                detail: err.to_string(),
            })
        }
    }
}

fn load_and_align(
    source: &dyn TrajectorySource,
    object: &str,
    config: &AnalysisConfig,
) -> Result<AlignedSet, AnalysisError> {
    check_object_name(object)?;
    let ground_truth = source.load(object, Source::GroundTruth)?;
    let simulated = source.load(object, Source::Simulated)?;
    let analytic = source.load(object, Source::Analytic)?;

    let set = align(&ground_truth, &simulated, &analytic, config.min_aligned_rows)?;
    debug!(
        object,
        ground_truth = ground_truth.len(),
        simulated = simulated.len(),
        analytic = analytic.len(),
        aligned = set.records.len(),
        "aligned series"
    );
    Ok(set)
}

/// Run metrics, classification, and anomaly scoring on an aligned set.
///
/// Pipeline stages:
/// 1. MetricsEngine - Reduce positional deviation to a metric tuple
/// 2. BehaviorClassifier - Label each model's error behavior
/// 3. AnomalyDetector - Score records against the local baseline
pub fn analyze_aligned(set: &AlignedSet, config: &AnalysisConfig) -> ObjectReport {
    let classifier = BehaviorClassifier::new(config.classifier);
    let detector = AnomalyDetector::new(config.anomaly);
    let samples = set.records.len();

    let metrics: Vec<MetricsRow> = Model::ALL
        .iter()
        .map(|&model| {
            let tuple = MetricsEngine::compute(set, model);
            MetricsRow {
                object: set.object.clone(),
                model,
                samples,
                rms_error: tuple.rms,
                slope: tuple.slope,
                intercept: tuple.intercept,
                r_squared: tuple.r_squared,
                ratio: tuple.endpoint_ratio,
                volatility: tuple.volatility,
                behavior_class: classifier.classify(&tuple),
            }
        })
        .collect();

    let unified = unify(&set.object, &metrics[0], &metrics[1]);
    debug!(
        object = %set.object,
        simulated = %unified.simulated_class,
        analytic = %unified.analytic_class,
        "classified"
    );

    ObjectReport {
        object: set.object.clone(),
        detailed: set.records.iter().map(DetailedRow::from).collect(),
        metrics,
        unified,
        simulated_anomalies: detector.detect(set, Model::Simulated),
        analytic_anomalies: detector.detect(set, Model::Analytic),
    }
}

fn unify(object: &str, simulated: &MetricsRow, analytic: &MetricsRow) -> UnifiedRow {
    let better_model = if analytic.rms_error < simulated.rms_error {
        Model::Analytic
    } else {
        Model::Simulated
    };

    UnifiedRow {
        object: object.to_string(),
        simulated_rms_error: simulated.rms_error,
        analytic_rms_error: analytic.rms_error,
        simulated_ratio: simulated.ratio,
        analytic_ratio: analytic.ratio,
        simulated_volatility: simulated.volatility,
        analytic_volatility: analytic.volatility,
        simulated_class: simulated.behavior_class,
        analytic_class: analytic.behavior_class,
        better_model,
    }
}

/// Outcomes of a batch, ordered by object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub reports: Vec<ObjectReport>,
    pub skipped: Vec<SkippedObject>,
}

impl BatchResult {
    /// Collect outcomes in any order into an object-ordered batch
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = ObjectOutcome>) -> Self {
        let mut batch = BatchResult::default();
        for outcome in outcomes {
            match outcome {
                ObjectOutcome::Analyzed(report) => batch.reports.push(*report),
                ObjectOutcome::Skipped(skipped) => batch.skipped.push(skipped),
            }
        }
        batch.reports.sort_by(|a, b| a.object.cmp(&b.object));
        batch.skipped.sort_by(|a, b| a.object.cmp(&b.object));
        batch
    }

    pub fn metrics_rows(&self) -> Vec<MetricsRow> {
        self.reports
            .iter()
            .flat_map(|r| r.metrics.iter().cloned())
            .collect()
    }

    pub fn unified_rows(&self) -> Vec<UnifiedRow> {
        self.reports.iter().map(|r| r.unified.clone()).collect()
    }

    pub fn anomaly_summaries(&self, model: Model) -> Vec<AnomalySummary> {
        self.reports
            .iter()
            .map(|r| r.anomalies(model).summary.clone())
            .collect()
    }

    /// Cross-model comparison with the analytic model as reference (A) and
    /// the simulated model as challenger (B)
    pub fn comparison(&self) -> ComparisonReport {
        let table = |model| -> Vec<ModelErrorSummary> {
            self.anomaly_summaries(model)
                .iter()
                .map(ModelErrorSummary::from)
                .collect()
        };
        ModelComparator::new(Model::Analytic.as_str(), Model::Simulated.as_str())
            .compare(&table(Model::Analytic), &table(Model::Simulated))
    }
}

/// Batch driver bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct DivergenceAnalyzer {
    config: AnalysisConfig,
}

impl DivergenceAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze every object the source offers
    pub fn run(&self, source: &dyn TrajectorySource) -> Result<BatchResult, AnalysisError> {
        let objects = source.objects()?;
        Ok(self.analyze_batch(source, &objects))
    }

    /// Analyze the named objects.
    ///
    /// Repeated names are analyzed once. Objects are independent; with the
    /// `parallel` feature they run on the rayon pool. The result is the same
    /// either way.
    pub fn analyze_batch(&self, source: &dyn TrajectorySource, objects: &[String]) -> BatchResult {
        let objects: Vec<&str> = objects
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        info!(objects = objects.len(), "starting divergence batch");

        let outcomes = self.analyze_all(source, &objects);
        let batch = BatchResult::from_outcomes(outcomes);

        info!(
            analyzed = batch.reports.len(),
            skipped = batch.skipped.len(),
            "divergence batch complete"
        );
        batch
    }

    #[cfg(feature = "parallel")]
    fn analyze_all(&self, source: &dyn TrajectorySource, objects: &[&str]) -> Vec<ObjectOutcome> {
        use rayon::prelude::*;

        objects
            .par_iter()
            .map(|object| analyze_object(source, object, &self.config))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn analyze_all(&self, source: &dyn TrajectorySource, objects: &[&str]) -> Vec<ObjectOutcome> {
        objects
            .iter()
            .map(|object| analyze_object(source, object, &self.config))
            .collect()
    }
}
