//! Report writing
//!
//! This module writes batch results as flat CSV tables plus the JSON
//! aggregate and run manifest. Every table is a pure function of the batch,
//! so identical inputs give byte-identical files. Only the manifest carries
//! run-specific values.

use crate::comparator::ComparisonReport;
use crate::error::AnalysisError;
use crate::loader::check_object_name;
use crate::pipeline::BatchResult;
use crate::types::Model;
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub const METRICS_SUMMARY_FILE: &str = "Metrics_Summary.csv";
pub const UNIFIED_COMPARISON_FILE: &str = "Unified_Model_Comparison.csv";
pub const MODEL_COMPARISON_FILE: &str = "Model_Comparison.csv";
pub const COMPARISON_AGGREGATE_FILE: &str = "Model_Comparison_Aggregate.json";
pub const SKIPPED_OBJECTS_FILE: &str = "Skipped_Objects.csv";
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// `<object>_Detailed_Comparison.csv`
pub fn detailed_file(object: &str) -> String {
    format!("{object}_Detailed_Comparison.csv")
}

/// `<object>_<model>_ZScore.csv`
pub fn zscore_file(object: &str, model: Model) -> String {
    format!("{object}_{model}_ZScore.csv")
}

/// `ZScore_Summary_<model>.csv`
pub fn zscore_summary_file(model: Model) -> String {
    format!("ZScore_Summary_{model}.csv")
}

/// Serialize rows as CSV with a header taken from the row type.
///
/// An empty slice produces an empty table.
pub fn to_csv_bytes<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, AnalysisError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| AnalysisError::Io(e.into_error()))
}

/// Write rows to a CSV file
pub fn write_table<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), AnalysisError> {
    let path = path.as_ref();
    fs::write(path, to_csv_bytes(rows)?)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

/// Read a CSV table, ignoring columns the row type does not name
pub fn read_table<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Producer metadata embedded in the run manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub producer: ManifestProducer,
    pub computed_at_utc: String,
    pub objects_analyzed: usize,
    pub objects_skipped: usize,
    pub files: Vec<String>,
}

/// Writes batch outputs into one directory
pub struct ReportWriter {
    out_dir: PathBuf,
    instance_id: String,
}

impl ReportWriter {
    /// Create a writer with a unique instance ID
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a writer with a specific instance ID
    pub fn with_instance_id(out_dir: impl Into<PathBuf>, instance_id: String) -> Self {
        Self {
            out_dir: out_dir.into(),
            instance_id,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Write every table for a batch, then the manifest.
    ///
    /// Returns the manifest, which lists the tables written. Fails before
    /// writing anything if an object name cannot be used as a file name.
    pub fn write_batch(&self, batch: &BatchResult) -> Result<RunManifest, AnalysisError> {
        for report in &batch.reports {
            check_object_name(&report.object)?;
        }
        fs::create_dir_all(&self.out_dir)?;
        let mut files = Vec::new();

        for report in &batch.reports {
            files.push(self.table(&detailed_file(&report.object), &report.detailed)?);
            for model in Model::ALL {
                let records = &report.anomalies(model).records;
                files.push(self.table(&zscore_file(&report.object, model), records)?);
            }
        }

        files.push(self.table(METRICS_SUMMARY_FILE, &batch.metrics_rows())?);
        files.push(self.table(UNIFIED_COMPARISON_FILE, &batch.unified_rows())?);
        for model in Model::ALL {
            files.push(self.table(&zscore_summary_file(model), &batch.anomaly_summaries(model))?);
        }
        files.extend(self.write_comparison(&batch.comparison())?);
        files.push(self.table(SKIPPED_OBJECTS_FILE, &batch.skipped)?);

        let manifest = RunManifest {
            producer: ManifestProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            objects_analyzed: batch.reports.len(),
            objects_skipped: batch.skipped.len(),
            files,
        };
        fs::write(
            self.out_dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(manifest)
    }

    /// Write the comparison table and, when any object was compared, the
    /// aggregate JSON. Returns the file names written.
    pub fn write_comparison(&self, comparison: &ComparisonReport) -> Result<Vec<String>, AnalysisError> {
        fs::create_dir_all(&self.out_dir)?;
        let mut files = vec![self.table(MODEL_COMPARISON_FILE, &comparison.records)?];

        if let Some(aggregate) = &comparison.aggregate {
            fs::write(
                self.out_dir.join(COMPARISON_AGGREGATE_FILE),
                serde_json::to_string_pretty(aggregate)?,
            )?;
            files.push(COMPARISON_AGGREGATE_FILE.to_string());
        }
        Ok(files)
    }

    fn table<T: Serialize>(&self, name: &str, rows: &[T]) -> Result<String, AnalysisError> {
        write_table(self.out_dir.join(name), rows)?;
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModelErrorSummary, StabilityClass};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_names() {
        assert_eq!(detailed_file("1_Ceres"), "1_Ceres_Detailed_Comparison.csv");
        assert_eq!(zscore_file("1_Ceres", Model::Simulated), "1_Ceres_simulated_ZScore.csv");
        assert_eq!(zscore_summary_file(Model::Analytic), "ZScore_Summary_analytic.csv");
    }

    #[test]
    fn test_summary_table_round_trip_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        fs::write(
            &path,
            "object,samples,mean_delta_r,mean_delta_v,max_z_score,stability_class\n\
             1_Ceres,40,0.10,0.002,3.1,Marginally Stable\n\
             4_Vesta,40,0.08,0.001,,\n",
        )
        .unwrap();

        let rows: Vec<ModelErrorSummary> = read_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].object, "1_Ceres");
        assert_eq!(rows[0].max_z_score, Some(3.1));
        assert_eq!(rows[0].stability_class, Some(StabilityClass::MarginallyStable));
        assert_eq!(rows[0].anomaly_count, None);
        assert_eq!(rows[1].max_z_score, None);
        assert_eq!(rows[1].stability_class, None);
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        fs::write(&path, "object,mean_delta_r\n1_Ceres,0.1\n").unwrap();
        assert!(read_table::<ModelErrorSummary>(&path).is_err());
    }

    #[test]
    fn test_csv_bytes_are_stable() {
        let rows = vec![ModelErrorSummary {
            object: "1_Ceres".to_string(),
            mean_delta_r: 0.1,
            mean_delta_v: 0.002,
            max_z_score: None,
            anomaly_count: Some(0),
            stability_class: Some(StabilityClass::Stable),
        }];
        let text = String::from_utf8(to_csv_bytes(&rows).unwrap()).unwrap();
        assert_eq!(
            text,
            "object,mean_delta_r,mean_delta_v,max_z_score,anomaly_count,stability_class\n\
             1_Ceres,0.1,0.002,,0,Stable\n"
        );
        assert!(to_csv_bytes::<ModelErrorSummary>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_write_comparison_without_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::with_instance_id(dir.path(), "test".to_string());
        let files = writer
            .write_comparison(&ComparisonReport {
                records: Vec::new(),
                aggregate: None,
            })
            .unwrap();

        assert_eq!(files, vec![MODEL_COMPARISON_FILE.to_string()]);
        assert!(!dir.path().join(COMPARISON_AGGREGATE_FILE).exists());
    }

    #[test]
    fn test_escaping_object_name_writes_nothing() {
        use crate::config::AnalysisConfig;
        use crate::pipeline::analyze_aligned;
        use crate::types::{AlignedRecord, AlignedSet};
        use chrono::{Duration, NaiveDate};

        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let set = AlignedSet {
            object: "../escape".to_string(),
            records: (0..10)
                .map(|i| AlignedRecord {
                    date: start + Duration::days(i),
                    r_truth: 2.0,
                    v_truth: 0.01,
                    r_simulated: 2.1,
                    v_simulated: 0.01,
                    r_analytic: 2.2,
                    v_analytic: 0.01,
                })
                .collect(),
        };
        let batch = BatchResult {
            reports: vec![analyze_aligned(&set, &AnalysisConfig::default())],
            skipped: Vec::new(),
        };

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let err = ReportWriter::new(&out).write_batch(&batch).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidObjectName(_)));
        assert!(!out.exists());
        assert!(!dir.path().join(detailed_file("escape")).exists());
    }
}
