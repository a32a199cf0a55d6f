//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use pressure::config::{AnalysisConfigBuilder, MAX_WORKERS};
use pressure::{load_config, load_config_file, AnalysisConfig, Analyzer, PropagationMode};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > MAX_WORKERS {
        Err(format!("workers cannot exceed {}", MAX_WORKERS))
    } else {
        Ok(n)
    }
}

fn parse_penalty(s: &str) -> Result<f64, String> {
    let p: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err("penalty must be within [0, 1]".to_string())
    }
}

/// Pressure - rank functions by the allocation pressure they cause
#[derive(Parser, Debug)]
#[command(name = "pressure")]
#[command(
    version,
    about = "Score call graphs by direct and propagated allocation pressure",
    after_help = "\
Examples:
  pressure analyze records/*.json                 Analyze extracted function records
  pressure analyze out.json --top 20              Only the 20 highest scores
  pressure analyze out.json --config pressure.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze JSON files of function records and print the result as JSON
    Analyze {
        /// Record files, each a JSON array of function records
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Config file (default: pressure.toml in the current directory)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Score test files like production code
        #[arg(long)]
        include_test_files: bool,

        /// Multiplier for test-file scores (0.0-1.0)
        #[arg(long, value_parser = parse_penalty)]
        test_file_penalty: Option<f64>,

        /// Propagation strategy
        #[arg(long, value_parser = ["auto", "resolved", "name_indexed"])]
        mode: Option<String>,

        /// Number of ingest workers (1-64)
        #[arg(long, value_parser = parse_workers)]
        workers: Option<usize>,

        /// Keep only the N highest scores
        #[arg(long)]
        top: Option<usize>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            inputs,
            config,
            include_test_files,
            test_file_penalty,
            mode,
            workers,
            top,
        } => {
            let base = match config {
                Some(path) => load_config_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => {
                    let cwd = std::env::current_dir().context("Failed to read current directory")?;
                    load_config(&cwd)
                }
            };
            let config =
                apply_overrides(base, include_test_files, test_file_penalty, mode, workers)?;
            run_analyze(inputs, config, top)
        }
    }
}

fn apply_overrides(
    base: AnalysisConfig,
    include_test_files: bool,
    test_file_penalty: Option<f64>,
    mode: Option<String>,
    workers: Option<usize>,
) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfigBuilder::from_config(base);
    if include_test_files {
        builder = builder.include_test_files(true);
    }
    if let Some(penalty) = test_file_penalty {
        builder = builder.test_file_penalty(penalty);
    }
    if let Some(mode) = mode.as_deref() {
        builder = builder.propagation_mode(match mode {
            "resolved" => PropagationMode::Resolved,
            "name_indexed" => PropagationMode::NameIndexed,
            _ => PropagationMode::Auto,
        });
    }
    if let Some(workers) = workers {
        builder = builder.workers(workers);
    }
    builder.build().context("Invalid configuration")
}

fn run_analyze(inputs: Vec<PathBuf>, config: AnalysisConfig, top: Option<usize>) -> Result<()> {
    let analyzer = Analyzer::new(config).context("Invalid configuration")?;
    let (mut result, stats) = analyzer
        .analyze_files(inputs)
        .context("Failed to ingest record files")?;

    info!(
        "Read {} records from {} files ({} failed)",
        stats.records, stats.processed, stats.failed
    );

    if let Some(n) = top {
        result.scores.truncate(n);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &result).context("Failed to write result")?;
    writeln!(out)?;
    Ok(())
}
