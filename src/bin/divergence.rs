//! Divergence CLI - Command-line interface for Orbit Divergence
//!
//! Commands:
//! - analyze: Run the divergence batch over a source layout and write all tables
//! - compare: Compare two per-object error summary tables
//! - doctor: Diagnose configuration and source directories
//! - config: Print the default configuration

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use orbit_divergence::config::{AnalysisConfig, SourceLayout};
use orbit_divergence::report::{read_table, ReportWriter};
use orbit_divergence::types::{ModelErrorSummary, Source};
use orbit_divergence::{
    AnalysisError, DirectorySource, DivergenceAnalyzer, ModelComparator, TrajectorySource,
    PRODUCER_NAME, VERSION,
};

/// Divergence - multi-model trajectory divergence analysis
#[derive(Parser)]
#[command(name = "divergence")]
#[command(version = VERSION)]
#[command(about = "Compare trajectory models against a ground-truth ephemeris", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every discoverable object and write the result tables
    Analyze {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root holding real/, rebound/ and manual/ (overrides the configured layout)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "results/analysis")]
        output: PathBuf,

        /// Minimum aligned rows per object
        #[arg(long)]
        min_rows: Option<usize>,

        /// Anomaly z-score threshold
        #[arg(long)]
        z_threshold: Option<f64>,

        /// Analyze only these objects (comma separated)
        #[arg(long, value_delimiter = ',')]
        objects: Vec<String>,

        /// Print the run manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two per-object summary tables (A is the reference)
    Compare {
        /// Summary table for model A
        #[arg(long)]
        a: PathBuf,

        /// Summary table for model B
        #[arg(long)]
        b: PathBuf,

        /// Display name for model A
        #[arg(long, default_value = "A")]
        model_a: String,

        /// Display name for model B
        #[arg(long, default_value = "B")]
        model_b: String,

        /// Output directory for the comparison table and aggregate
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Check configuration and source directories
    Doctor {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root holding real/, rebound/ and manual/
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration as JSON
    Config,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orbit_divergence=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), DivergenceCliError> {
    match cli.command {
        Commands::Analyze {
            config,
            data_dir,
            output,
            min_rows,
            z_threshold,
            objects,
            json,
        } => {
            let mut config = load_config(config.as_deref(), data_dir.as_deref())?;
            if let Some(min_rows) = min_rows {
                config.min_aligned_rows = min_rows;
            }
            if let Some(z) = z_threshold {
                config.anomaly.z_threshold = z;
            }
            config.validate()?;
            cmd_analyze(config, &output, &objects, json)
        }

        Commands::Compare {
            a,
            b,
            model_a,
            model_b,
            output,
        } => cmd_compare(&a, &b, &model_a, &model_b, &output),

        Commands::Doctor {
            config,
            data_dir,
            json,
        } => cmd_doctor(config.as_deref(), data_dir.as_deref(), json),

        Commands::Config => {
            println!("{}", AnalysisConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn load_config(
    path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<AnalysisConfig, DivergenceCliError> {
    let mut config = match path {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(root) = data_dir {
        config.layout = SourceLayout::under(root);
    }
    Ok(config)
}

fn cmd_analyze(
    config: AnalysisConfig,
    output: &Path,
    objects: &[String],
    json: bool,
) -> Result<(), DivergenceCliError> {
    let source = DirectorySource::new(config.layout.clone());
    let analyzer = DivergenceAnalyzer::new(config);

    let batch = if objects.is_empty() {
        analyzer.run(&source)?
    } else {
        analyzer.analyze_batch(&source, objects)
    };

    if batch.reports.is_empty() && batch.skipped.is_empty() {
        return Err(DivergenceCliError::NoObjects);
    }

    let manifest = ReportWriter::new(output).write_batch(&batch)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        println!(
            "Analyzed {} object(s), skipped {}; {} file(s) written to {}",
            manifest.objects_analyzed,
            manifest.objects_skipped,
            manifest.files.len(),
            output.display()
        );
        for skipped in &batch.skipped {
            println!("  skipped {}: {} ({})", skipped.object, skipped.reason, skipped.detail);
        }
    }
    Ok(())
}

fn cmd_compare(
    a: &Path,
    b: &Path,
    model_a: &str,
    model_b: &str,
    output: &Path,
) -> Result<(), DivergenceCliError> {
    let table_a: Vec<ModelErrorSummary> = read_table(a)?;
    let table_b: Vec<ModelErrorSummary> = read_table(b)?;

    let comparison = ModelComparator::new(model_a, model_b).compare(&table_a, &table_b);
    ReportWriter::new(output).write_comparison(&comparison)?;

    match &comparison.aggregate {
        Some(aggregate) => println!("{}", serde_json::to_string_pretty(aggregate)?),
        None => return Err(DivergenceCliError::NoCommonObjects),
    }
    Ok(())
}

fn cmd_doctor(
    config_path: Option<&Path>,
    data_dir: Option<&Path>,
    json: bool,
) -> Result<(), DivergenceCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, VERSION),
    });

    let config = match load_config(config_path, data_dir) {
        Ok(config) => match config.validate() {
            Ok(()) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "min_aligned_rows={}, z_threshold={}",
                        config.min_aligned_rows, config.anomaly.z_threshold
                    ),
                });
                Some(config)
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                });
                None
            }
        },
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            });
            None
        }
    };

    if let Some(config) = config {
        let layout = &config.layout;
        for (source, dir) in [
            (Source::GroundTruth, &layout.ground_truth_dir),
            (Source::Simulated, &layout.simulated_dir),
            (Source::Analytic, &layout.analytic_dir),
        ] {
            checks.push(directory_check(source, dir));
        }

        match DirectorySource::new(layout.clone()).objects() {
            Ok(objects) if objects.is_empty() => checks.push(DoctorCheck {
                name: "objects".to_string(),
                status: CheckStatus::Warning,
                message: format!(
                    "No *{} files in {}",
                    layout.simulated_suffix,
                    layout.simulated_dir.display()
                ),
            }),
            Ok(objects) => checks.push(DoctorCheck {
                name: "objects".to_string(),
                status: CheckStatus::Ok,
                message: format!("{} object(s) discoverable", objects.len()),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "objects".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            }),
        }
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Divergence Doctor Report");
        println!("========================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(DivergenceCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn directory_check(source: Source, dir: &Path) -> DoctorCheck {
    let name = format!("{source}_dir");
    match fs::read_dir(dir) {
        Ok(entries) => DoctorCheck {
            name,
            status: CheckStatus::Ok,
            message: format!("{} ({} entries)", dir.display(), entries.count()),
        },
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", dir.display(), e),
        },
    }
}

// Error types

#[derive(Debug)]
enum DivergenceCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    NoObjects,
    NoCommonObjects,
    DoctorFailed,
}

impl From<io::Error> for DivergenceCliError {
    fn from(e: io::Error) -> Self {
        DivergenceCliError::Io(e)
    }
}

impl From<AnalysisError> for DivergenceCliError {
    fn from(e: AnalysisError) -> Self {
        DivergenceCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for DivergenceCliError {
    fn from(e: serde_json::Error) -> Self {
        DivergenceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<DivergenceCliError> for CliError {
    fn from(e: DivergenceCliError) -> Self {
        match e {
            DivergenceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            DivergenceCliError::Analysis(AnalysisError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'divergence config' for a valid starting point".to_string()),
            },
            DivergenceCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'divergence doctor' to check the source layout".to_string()),
            },
            DivergenceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            DivergenceCliError::NoObjects => CliError {
                code: "NO_OBJECTS".to_string(),
                message: "No objects found to analyze".to_string(),
                hint: Some("Check the simulated directory and file suffix".to_string()),
            },
            DivergenceCliError::NoCommonObjects => CliError {
                code: "NO_COMMON_OBJECTS".to_string(),
                message: "The two tables share no objects".to_string(),
                hint: Some("Both tables must use the same object identifiers".to_string()),
            },
            DivergenceCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
