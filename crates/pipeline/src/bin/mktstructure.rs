//! `mktstructure`: clean, classify and compute microstructure measures over a
//! directory of per-security, per-day TAQ files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mktstructure_core::Config;
use mktstructure_pipeline::{classify_stage, clean_stage, compute_stage, logging, StageReport};
use mktstructure_runner::ParallelRunner;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mktstructure", about = "Market microstructure measures from TAQ data")]
struct Cli {
    /// JSON configuration file; defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker count (0 = one per CPU, 1 = sequential). Overrides the config.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Data directory. Overrides the config.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sort and de-duplicate raw files.
    Clean {
        /// Overwrite raw files instead of writing `*.sorted.csv.gz`.
        #[arg(long)]
        replace: bool,
    },
    /// Classify trades into signed-trade and quote files.
    Classify,
    /// Compute measures and write the results ledger.
    Compute {
        /// Measures to compute (repeatable); all when omitted.
        #[arg(long = "measure", value_name = "NAME")]
        measures: Vec<String>,
        /// Results file. Overrides the config.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(workers) = cli.workers {
        config.runner.workers = workers;
    }
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    if let Command::Clean { replace: true } = cli.command {
        config.data.replace = true;
    }
    if let Command::Compute { out: Some(out), .. } = &cli.command {
        config.ledger.out = out.clone();
    }
    config.validate().context("invalid configuration")?;

    let runner = ParallelRunner::from_config(&config.runner);
    info!(data_dir = %config.data.data_dir.display(), workers = runner.workers(), "starting");

    let report: StageReport = match &cli.command {
        Command::Clean { .. } => clean_stage(&config, &runner).context("clean failed")?,
        Command::Classify => classify_stage(&config, &runner).context("classify failed")?,
        Command::Compute { measures, .. } => {
            compute_stage(&config, &runner, measures).context("compute failed")?
        }
    };

    info!(
        processed = report.processed,
        failed = report.failed,
        rows = report.rows,
        "done"
    );
    Ok(())
}
