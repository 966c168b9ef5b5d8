#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the dataset and model artifacts.
//!
//! All paths are relative to the project root.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// manifest directory itself if it has fewer than two ancestors.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .ancestors()
        .nth(2)
        .unwrap_or(manifest)
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the `models/` directory path.
#[must_use]
pub fn models_dir() -> PathBuf {
    project_root().join("models")
}

/// Returns the default path of the candidate location CSV.
#[must_use]
pub fn default_dataset_path() -> PathBuf {
    data_dir().join("sample_adspaces.csv")
}

/// Returns the default path of the persisted model bundle.
#[must_use]
pub fn default_model_path() -> PathBuf {
    models_dir().join("model_bundle.json")
}
