#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Impressions model interface, gradient-boosted regressor, and model
//! bundle persistence.
//!
//! The scoring pipeline only depends on the [`ImpressionModel`] trait. The
//! production model is a [`GradientBoostedRegressor`] over smartcore
//! regression trees, trained offline and served through the
//! [`ModelBundle`] it is persisted in. Tests substitute [`ConstantModel`]
//! or a closure.

pub mod boosting;
pub mod bundle;
pub mod labels;

use std::path::PathBuf;

pub use boosting::{BoostingParams, GradientBoostedRegressor};
pub use bundle::{BUNDLE_FORMAT_VERSION, ModelBundle, ScalerSnapshot};

/// Errors that can occur while loading, training, or running a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model bundle could not be loaded.
    #[error("Failed to load model from {}: {reason}", path.display())]
    Unavailable {
        /// Location of the bundle.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Prediction failed for a well-formed request.
    #[error("Model prediction failed: {0}")]
    Inference(String),

    /// Fitting the model failed.
    #[error("Model training failed: {0}")]
    Training(String),

    /// A feature matrix row had the wrong width.
    #[error("Feature matrix row {row} has {found} values, expected {expected}")]
    Shape {
        /// Zero-based row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A dense, row-major numeric feature matrix with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Builds a matrix, checking that every row has one value per column.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Shape`] if any row has the wrong width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(ModelError::Shape {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }

        Ok(Self { columns, rows })
    }

    /// Column names, in matrix order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the values of one column.
    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[index])
    }
}

/// A trained regressor that predicts monthly impressions per location.
///
/// Implementations must be deterministic for fixed weights and input, and
/// return exactly one prediction per matrix row.
pub trait ImpressionModel: Send + Sync {
    /// Predicts impressions for every row of the feature matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Inference`] if the matrix is incompatible with
    /// the model or prediction fails.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ImpressionModel for F
where
    F: Fn(&FeatureMatrix) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        self(features)
    }
}

/// A model that predicts the same value for every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantModel(pub f64);

impl ImpressionModel for ConstantModel {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; features.n_rows()])
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = FeatureMatrix::from_rows(cols(2), vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Shape {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn column_iterates_values() {
        let m = FeatureMatrix::from_rows(cols(2), vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![2.0, 4.0]);
    }

    #[test]
    fn constant_model_predicts_one_value_per_row() {
        let m = FeatureMatrix::from_rows(cols(1), vec![vec![0.0]; 3]).unwrap();
        let preds = ConstantModel(500.0).predict(&m).unwrap();
        assert_eq!(preds, vec![500.0; 3]);
    }

    #[test]
    fn closures_are_models() {
        let model = |m: &FeatureMatrix| -> Result<Vec<f64>, ModelError> {
            Ok(m.column(0).map(|v| v * 2.0).collect())
        };
        let m = FeatureMatrix::from_rows(cols(1), vec![vec![1.0], vec![2.0]]).unwrap();
        assert_eq!(model.predict(&m).unwrap(), vec![2.0, 4.0]);
    }
}
