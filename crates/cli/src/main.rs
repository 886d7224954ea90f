//! Schedule Auto-Fill CLI
//!
//! A command-line tool for training the scenario models from scraped
//! semester CSVs and for running offline predictions against a saved
//! artifact set, without standing up the HTTP server.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use predictor_lib::Scenario;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Schedule Auto-Fill CLI
#[derive(Parser)]
#[command(name = "autofill")]
#[command(author, version, about = "Train and query the schedule auto-fill models", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train all scenario models from a directory of CSV batches
    Train {
        /// Directory of scraped semester CSVs
        #[arg(long, env = "AUTOFILL_DATA_DIR")]
        data_dir: PathBuf,

        /// Directory the model artifacts are written into
        #[arg(long, env = "AUTOFILL_ARTIFACTS_DIR", default_value = "ml_artifacts")]
        artifacts_dir: PathBuf,

        /// Trees per forest
        #[arg(long, default_value_t = 200)]
        trees: usize,

        /// Negative combinations sampled per positive row
        #[arg(long, default_value_t = 3)]
        negatives_per_row: usize,

        /// Seed for sampling and model fitting
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Run one prediction against saved artifacts
    Predict {
        /// Directory holding the model artifacts
        #[arg(long, env = "AUTOFILL_ARTIFACTS_DIR", default_value = "ml_artifacts")]
        artifacts_dir: PathBuf,

        /// Scenario to query (instructor, slot, course or plausibility)
        #[arg(long, short)]
        scenario: Scenario,

        /// Path to the JSON request body, `-` for stdin
        #[arg(long, short)]
        request: PathBuf,

        /// How many ranked candidates to return
        #[arg(long, short)]
        k: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer())
        .init();

    match cli.command {
        Commands::Train {
            data_dir,
            artifacts_dir,
            trees,
            negatives_per_row,
            seed,
        } => commands::train::run(&data_dir, &artifacts_dir, trees, negatives_per_row, seed),
        Commands::Predict {
            artifacts_dir,
            scenario,
            request,
            k,
        } => commands::predict::run(&artifacts_dir, scenario, &request, k),
    }
}
