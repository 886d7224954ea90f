//! Batch training over a directory of scraped semester CSVs

use std::path::Path;

use anyhow::Result;
use predictor_lib::dataset;
use predictor_lib::trainer::{self, TrainerConfig};
use tracing::info;

pub fn run(
    data_dir: &Path,
    artifacts_dir: &Path,
    trees: usize,
    negatives_per_row: usize,
    seed: u64,
) -> Result<()> {
    let records = dataset::load_raw_batches(data_dir)?;
    info!(rows = records.len(), "loaded raw schedule batches");

    let (engineered, baseline) = dataset::engineer(&records);
    let config = TrainerConfig {
        n_trees: trees,
        negatives_per_row,
        seed,
        ..TrainerConfig::default()
    };
    let report = trainer::train_all(&engineered, baseline, artifacts_dir, &config)?;

    println!("Trained on {} engineered rows", report.rows);
    for (scenario, accuracy) in &report.scenarios {
        println!("  {scenario:<13} holdout accuracy {accuracy:.3}");
    }
    println!("Artifacts written to {}", artifacts_dir.display());

    Ok(())
}
