#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline training of the impressions model.
//!
//! Builds features over the whole dataset the same way the server does for
//! a candidate set, picks recorded or synthesized labels, fits the
//! gradient-boosted regressor, and wraps it in a [`ModelBundle`].

use std::path::Path;

use adspecta_dataset::{DatasetError, LocationDataset};
use adspecta_location_models::Candidate;
use adspecta_model::labels::training_labels;
use adspecta_model::{BoostingParams, GradientBoostedRegressor, ModelBundle, ModelError};
use adspecta_scoring::ScoringError;
use adspecta_scoring::features::{FeatureSet, build_features};

/// Errors that can occur while training.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Features(#[from] ScoringError),
}

/// Fits a model bundle on every row of `dataset`.
///
/// `on_round` is called with the number of trees built after each
/// boosting round.
///
/// # Errors
///
/// Returns [`TrainError::Features`] if the dataset has no rows, or
/// [`TrainError::Model`] if fitting fails.
pub fn train(
    dataset: &LocationDataset,
    params: BoostingParams,
    on_round: impl FnMut(usize),
) -> Result<ModelBundle, TrainError> {
    let candidates: Vec<Candidate> = dataset
        .records
        .iter()
        .cloned()
        .map(|record| Candidate {
            record,
            distance_km: 0.0,
        })
        .collect();

    let FeatureSet {
        matrix,
        rows,
        bounds,
    } = build_features(&dataset.available, candidates)?;
    log::info!(
        "Training on {} rows x {} features",
        matrix.n_rows(),
        matrix.n_cols()
    );

    let records: Vec<_> = rows.into_iter().map(|row| row.candidate.record).collect();
    let labels = training_labels(&records, dataset.labels_missing());

    let model = GradientBoostedRegressor::fit_with_progress(&matrix, &labels, params, on_round)?;

    Ok(ModelBundle::new(model, matrix.columns().to_vec(), bounds))
}

/// Loads the CSV at `data`, trains, and writes the bundle to `out`.
///
/// # Errors
///
/// Returns a [`TrainError`] if loading, training, or saving fails.
pub fn train_file(
    data: &Path,
    out: &Path,
    params: BoostingParams,
    on_round: impl FnMut(usize),
) -> Result<ModelBundle, TrainError> {
    let dataset = LocationDataset::from_path(data)?;
    log::info!("Loaded {} locations from {}", dataset.records.len(), data.display());

    let bundle = train(&dataset, params, on_round)?;
    bundle.save(out)?;

    Ok(bundle)
}
