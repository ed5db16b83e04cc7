//! Orbit Divergence - multi-model trajectory divergence analysis
//!
//! Orbit Divergence compares independently produced trajectories of the same
//! body against a ground-truth ephemeris through a deterministic pipeline:
//! source adaptation → temporal alignment → deviation metrics → behavior
//! classification → local anomaly scoring → cross-model comparison.
//!
//! ## Modules
//!
//! - **Loading**: [`adapters`] parse each producer's CSV export, [`loader`]
//!   locates series, [`align`] joins them on calendar date
//! - **Analysis**: [`metrics`], [`classifier`], [`anomaly`], [`comparator`]
//! - **Orchestration**: [`pipeline`] runs batches, [`report`] writes tables

pub mod adapters;
pub mod align;
pub mod anomaly;
pub mod baseline;
pub mod classifier;
pub mod comparator;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod types;

pub use comparator::{ComparisonReport, ModelComparator};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, SkipReason};
pub use loader::{DirectorySource, InMemorySource, TrajectorySource};
pub use pipeline::{analyze_object, BatchResult, DivergenceAnalyzer, ObjectOutcome, ObjectReport};
pub use report::{ReportWriter, RunManifest};

/// Crate version recorded in every run manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run manifests
pub const PRODUCER_NAME: &str = "orbit-divergence";
