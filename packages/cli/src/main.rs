#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the drishti enrolment signal pipeline.
//!
//! Uses `indicatif-log-bridge` (via [`drishti_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use drishti_cli_utils::{IndicatifProgress, MultiProgress};
use drishti_enrolment_models::DerivedRecord;
use drishti_pipeline::{
    PipelineConfig, load_table,
    report::{write_full_history, write_multi_horizon},
    run_full_history, run_multi_horizon,
};

#[derive(Parser)]
#[command(name = "drishti", about = "Enrolment governance signal pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive per-record features from a master CSV and write them out
    Features {
        /// Merged master enrolment CSV
        #[arg(long)]
        input: PathBuf,
        /// Destination CSV for the derived table
        #[arg(long, default_value = "data/master_features.csv")]
        output: PathBuf,
    },
    /// Run every signal over its own lookback horizon
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    /// Run every signal once over the entire history
    Analyze {
        #[command(flatten)]
        args: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Master or features CSV
    #[arg(long)]
    input: PathBuf,
    /// Directory for report files
    #[arg(long, default_value = "data/reports")]
    output_dir: PathBuf,
    /// TOML file with horizon and detector settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the anomaly model seed
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn config(&self) -> Result<PipelineConfig, drishti_pipeline::ConfigError> {
        let config = PipelineConfig::load(self.config.as_deref())?;
        Ok(match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        })
    }
}

fn load(
    multi: &MultiProgress,
    input: &Path,
) -> Result<Vec<DerivedRecord>, Box<dyn std::error::Error>> {
    let spinner = IndicatifProgress::spinner(multi, &format!("Loading {}", input.display()));
    let table = load_table(input)?;
    spinner.finish(format!("Loaded {} records", table.len()));
    Ok(table)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = drishti_cli_utils::init_logger();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Features { input, output } => {
            let table = load(&multi, &input)?;
            drishti_features::export::write_features_csv(&output, &table)?;
        }
        Commands::Run { args } => {
            let config = args.config()?;
            let table = load(&multi, &args.input)?;
            let progress = IndicatifProgress::steps_bar(&multi, "Horizons", 4);
            let report = run_multi_horizon(table, &config, progress).await?;
            let written = write_multi_horizon(&report, &args.output_dir)?;
            log::info!(
                "Wrote {} files to {}",
                written.len(),
                args.output_dir.display()
            );
        }
        Commands::Analyze { args } => {
            let config = args.config()?;
            let table = load(&multi, &args.input)?;
            let params = config.detection;
            let report =
                tokio::task::spawn_blocking(move || run_full_history(&table, &params)).await??;
            let written = write_full_history(&report, &args.output_dir)?;
            log::info!(
                "Wrote {} files to {}",
                written.len(),
                args.output_dir.display()
            );
        }
    }

    log::info!("Done in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
