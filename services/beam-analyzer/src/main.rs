//! Laser beam profile analyzer.
//!
//! Reads tab-separated detector dumps, runs the ISO 13694 / ISO 11145
//! characterization and writes a JSON report plus the cumulative-energy
//! table next to each input file.

mod batch;
mod config;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use beam_engine::{analyze, AnalysisConfig};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::FlagOverrides;

#[derive(Parser, Debug)]
#[command(name = "beam-analyzer")]
#[command(about = "Beam characterization of laser power-density profiles")]
struct Args {
    /// Profile file to analyze
    #[arg(required_unless_present = "batch", conflicts_with = "batch")]
    input: Option<PathBuf>,

    /// Analyze every profile in this directory
    #[arg(long)]
    batch: Option<PathBuf>,

    /// Upper clip level (0..1)
    #[arg(long)]
    eta: Option<f64>,

    /// Lower clip level (0..eta)
    #[arg(long)]
    epsilon: Option<f64>,

    /// Number of normal components of the plateau fit (1, 2 or 3)
    #[arg(long)]
    mix: Option<usize>,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Read, analyze and report one profile file.
pub(crate) fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<(PathBuf, PathBuf)> {
    let profile = profile_parser::read_profile(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;

    let analysis = analyze(&profile.grid, &profile.header, config)
        .with_context(|| format!("Failed to analyze profile: {}", path.display()))?;

    report::write(path, &analysis)
}

fn main() -> Result<()> {
    // BEAM_* settings may come from a .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json)?;

    let flags = FlagOverrides {
        eta: args.eta,
        epsilon: args.epsilon,
        mix_count: args.mix,
    };
    let config = config::resolve(args.config.as_deref(), flags)?;
    info!(
        eta = config.eta,
        epsilon = config.epsilon,
        mix = config.mix_count,
        "Resolved analysis configuration"
    );

    if let Some(dir) = &args.batch {
        let summary = batch::run(dir, &config)?;
        if !summary.failed.is_empty() {
            bail!(
                "{} of {} profiles failed",
                summary.failed.len(),
                summary.total()
            );
        }
        return Ok(());
    }

    let Some(input) = &args.input else {
        bail!("no input file given");
    };
    let (report_file, _) = analyze_file(input, &config)?;
    println!("{}", report_file.display());
    Ok(())
}
