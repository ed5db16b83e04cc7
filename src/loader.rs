//! Trajectory loading
//!
//! A [`TrajectorySource`] locates the three series of an object. The
//! directory-backed source reads the CSV exports described by a
//! [`SourceLayout`]; the in-memory source serves already built series.

use crate::adapters::adapter_for;
use crate::config::SourceLayout;
use crate::error::AnalysisError;
use crate::types::{Source, TrajectorySeries};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Reject object names that could not serve as a file name stem.
///
/// Names are joined onto input and output directories, so they must not
/// contain path separators or be a relative directory reference.
pub fn check_object_name(object: &str) -> Result<(), AnalysisError> {
    let escapes = object.is_empty()
        || object == "."
        || object == ".."
        || object.contains(|c: char| c == '/' || c == '\\');
    if escapes {
        return Err(AnalysisError::InvalidObjectName(object.to_string()));
    }
    Ok(())
}

/// Provider of per-object trajectory series
pub trait TrajectorySource: Sync {
    /// Load one series for an object
    fn load(&self, object: &str, source: Source) -> Result<TrajectorySeries, AnalysisError>;

    /// Objects this source can offer, sorted
    fn objects(&self) -> Result<Vec<String>, AnalysisError>;
}

/// Series read from CSV exports on disk
#[derive(Debug, Clone)]
pub struct DirectorySource {
    layout: SourceLayout,
}

impl DirectorySource {
    pub fn new(layout: SourceLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Candidate paths for an object's series, most specific first.
    ///
    /// Ground-truth exports are sometimes named with spaces where the other
    /// producers use underscores (`1 Ceres_Real.csv` vs `1_Ceres.csv`).
    pub fn candidate_paths(&self, object: &str, source: Source) -> Vec<PathBuf> {
        let (dir, suffix) = match source {
            Source::GroundTruth => (&self.layout.ground_truth_dir, &self.layout.ground_truth_suffix),
            Source::Simulated => (&self.layout.simulated_dir, &self.layout.simulated_suffix),
            Source::Analytic => (&self.layout.analytic_dir, &self.layout.analytic_suffix),
        };

        let mut paths = vec![dir.join(format!("{object}{suffix}"))];
        if source == Source::GroundTruth && object.contains('_') {
            let spaced = object.replace('_', " ");
            paths.push(dir.join(format!("{spaced}{suffix}")));
        }
        paths
    }
}

impl TrajectorySource for DirectorySource {
    fn load(&self, object: &str, source: Source) -> Result<TrajectorySeries, AnalysisError> {
        let path = self
            .candidate_paths(object, source)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| AnalysisError::MissingSource {
                object: object.to_string(),
                series: source,
            })?;

        debug!(object, %source, path = %path.display(), "loading series");
        let raw = fs::read_to_string(&path)?;
        adapter_for(source).parse(object, source, &raw)
    }

    /// Objects are discovered from the simulated directory
    fn objects(&self) -> Result<Vec<String>, AnalysisError> {
        let suffix = &self.layout.simulated_suffix;
        let mut objects = Vec::new();

        for entry in fs::read_dir(&self.layout.simulated_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(object) = name.strip_suffix(suffix.as_str()) {
                if !object.is_empty() {
                    objects.push(object.to_string());
                }
            }
        }

        objects.sort();
        objects.dedup();
        Ok(objects)
    }
}

/// Series held in memory, keyed by object and source
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: BTreeMap<(String, Source), TrajectorySeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a series
    pub fn insert(&mut self, series: TrajectorySeries) {
        self.series
            .insert((series.object.clone(), series.source), series);
    }

    pub fn with(mut self, series: TrajectorySeries) -> Self {
        self.insert(series);
        self
    }
}

impl TrajectorySource for InMemorySource {
    fn load(&self, object: &str, source: Source) -> Result<TrajectorySeries, AnalysisError> {
        self.series
            .get(&(object.to_string(), source))
            .cloned()
            .ok_or_else(|| AnalysisError::MissingSource {
                object: object.to_string(),
                series: source,
            })
    }

    fn objects(&self) -> Result<Vec<String>, AnalysisError> {
        let mut objects: Vec<String> = self.series.keys().map(|(o, _)| o.clone()).collect();
        objects.dedup();
        Ok(objects)
    }
}
