#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for training the impressions model.

use std::path::PathBuf;
use std::time::Instant;

use adspecta_cli_utils::StepProgress;
use adspecta_dataset::paths;
use adspecta_model::BoostingParams;
use clap::Parser;

#[derive(Parser)]
#[command(name = "adspecta_train", about = "Train the AdSpecta impressions model")]
struct Cli {
    /// Candidate location CSV to train on
    #[arg(long, default_value_os_t = paths::default_dataset_path())]
    data: PathBuf,
    /// Where to write the model bundle
    #[arg(long, default_value_os_t = paths::default_model_path())]
    out: PathBuf,
    /// Number of boosting rounds
    #[arg(long, default_value_t = BoostingParams::default().n_estimators)]
    estimators: usize,
    /// Maximum depth of each tree
    #[arg(long, default_value_t = BoostingParams::default().max_depth)]
    max_depth: u16,
    /// Shrinkage applied to each tree
    #[arg(long, default_value_t = BoostingParams::default().learning_rate)]
    learning_rate: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = adspecta_cli_utils::init_logger();
    let cli = Cli::parse();

    let params = BoostingParams {
        n_estimators: cli.estimators,
        max_depth: cli.max_depth,
        learning_rate: cli.learning_rate,
    };

    log::info!("Training started");
    let start = Instant::now();

    let progress = StepProgress::new(&multi, "Fitting model", params.n_estimators as u64);
    let bundle = adspecta_train::train_file(&cli.data, &cli.out, params, |round| {
        progress.set_position(round as u64);
    })?;
    progress.finish(format!("Fitted {} trees", bundle.model.n_trees()));

    log::info!(
        "Training finished in {:.1}s ({} features)",
        start.elapsed().as_secs_f64(),
        bundle.feature_columns.len()
    );

    Ok(())
}
