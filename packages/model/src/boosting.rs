//! Gradient boosting with squared-error loss over smartcore regression
//! trees.

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use crate::{FeatureMatrix, ImpressionModel, ModelError};

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Hyperparameters for [`GradientBoostedRegressor::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds (trees).
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    pub max_depth: u16,
    /// Shrinkage applied to every tree's output.
    pub learning_rate: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 6,
            learning_rate: 0.05,
        }
    }
}

impl BoostingParams {
    fn tree_parameters(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(1)
            .with_min_samples_split(2)
    }
}

/// An additive ensemble of regression trees on top of a constant base
/// score. Each tree is fitted to the residuals left by the trees before it.
#[derive(Debug, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    n_features: usize,
    base_score: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedRegressor {
    /// Fits the ensemble to `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Training`] if the matrix is empty, the label
    /// count does not match the row count, a label is not finite, the
    /// parameters are invalid, or a tree fails to fit.
    pub fn fit(
        features: &FeatureMatrix,
        labels: &[f64],
        params: BoostingParams,
    ) -> Result<Self, ModelError> {
        Self::fit_with_progress(features, labels, params, |_| {})
    }

    /// Same as [`Self::fit`], calling `on_round` with the number of trees
    /// built so far after each boosting round.
    ///
    /// # Errors
    ///
    /// See [`Self::fit`].
    pub fn fit_with_progress(
        features: &FeatureMatrix,
        labels: &[f64],
        params: BoostingParams,
        mut on_round: impl FnMut(usize),
    ) -> Result<Self, ModelError> {
        if features.is_empty() {
            return Err(ModelError::Training("no training rows".to_owned()));
        }
        if labels.len() != features.n_rows() {
            return Err(ModelError::Training(format!(
                "{} labels for {} rows",
                labels.len(),
                features.n_rows()
            )));
        }
        if let Some(i) = labels.iter().position(|y| !y.is_finite()) {
            return Err(ModelError::Training(format!(
                "label {i} is not finite: {}",
                labels[i]
            )));
        }
        if !params.learning_rate.is_finite() || params.learning_rate <= 0.0 || params.max_depth == 0
        {
            return Err(ModelError::Training(format!(
                "invalid parameters: learning_rate={}, max_depth={}",
                params.learning_rate, params.max_depth
            )));
        }

        #[allow(clippy::cast_precision_loss)]
        let base_score = labels.iter().sum::<f64>() / labels.len() as f64;

        let x = to_dense(features);
        let mut predictions = vec![base_score; labels.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let residuals: Vec<f64> = labels
                .iter()
                .zip(&predictions)
                .map(|(label, pred)| label - pred)
                .collect();

            let tree = Tree::fit(&x, &residuals, params.tree_parameters())
                .map_err(|e| ModelError::Training(format!("round {}: {e}", round + 1)))?;
            let step = tree
                .predict(&x)
                .map_err(|e| ModelError::Training(format!("round {}: {e}", round + 1)))?;
            for (pred, delta) in predictions.iter_mut().zip(step) {
                *pred += params.learning_rate * delta;
            }
            trees.push(tree);

            on_round(round + 1);
        }

        log::info!(
            "Fitted {} trees on {} rows x {} features (train RMSE {:.3})",
            trees.len(),
            features.n_rows(),
            features.n_cols(),
            rmse(&predictions, labels)
        );

        Ok(Self {
            n_features: features.n_cols(),
            base_score,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    /// Number of feature columns the model expects.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Checks the scalar parts of a deserialized model.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_score.is_finite() {
            return Err(format!("base score is not finite: {}", self.base_score));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(format!("invalid learning rate: {}", self.learning_rate));
        }
        if self.n_features == 0 {
            return Err("model has no features".to_owned());
        }
        Ok(())
    }
}

impl ImpressionModel for GradientBoostedRegressor {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if features.n_cols() != self.n_features {
            return Err(ModelError::Inference(format!(
                "feature matrix has {} columns, model expects {}",
                features.n_cols(),
                self.n_features
            )));
        }
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let x = to_dense(features);
        let mut predictions = vec![self.base_score; features.n_rows()];
        for tree in &self.trees {
            let step = tree
                .predict(&x)
                .map_err(|e| ModelError::Inference(e.to_string()))?;
            for (pred, delta) in predictions.iter_mut().zip(step) {
                *pred += self.learning_rate * delta;
            }
        }

        Ok(predictions)
    }

    fn name(&self) -> &'static str {
        "gradient_boosted_trees"
    }
}

// Callers guarantee a non-empty matrix.
fn to_dense(features: &FeatureMatrix) -> DenseMatrix<f64> {
    DenseMatrix::from_2d_vec(&features.rows().to_vec())
}

#[allow(clippy::cast_precision_loss)]
fn rmse(predictions: &[f64], labels: &[f64]) -> f64 {
    let sum: f64 = predictions
        .iter()
        .zip(labels)
        .map(|(p, y)| (p - y).powi(2))
        .sum();
    (sum / labels.len().max(1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let n = rows.first().map_or(0, Vec::len);
        FeatureMatrix::from_rows((0..n).map(|i| format!("f{i}")).collect(), rows).unwrap()
    }

    fn step_data() -> (FeatureMatrix, Vec<f64>) {
        let x = matrix((0..20).map(|i| vec![f64::from(i) / 19.0]).collect());
        let y = (0..20).map(|i| if i < 10 { 100.0 } else { 900.0 }).collect();
        (x, y)
    }

    #[test]
    fn learns_a_step_function() {
        let (x, y) = step_data();
        let model = GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).unwrap();

        let preds = model.predict(&x).unwrap();
        assert!(preds[0] < preds[19]);
        assert!((preds[0] - 100.0).abs() < 50.0, "low side {}", preds[0]);
        assert!((preds[19] - 900.0).abs() < 50.0, "high side {}", preds[19]);
    }

    #[test]
    fn zero_rounds_predicts_the_mean() {
        let (x, y) = step_data();
        let params = BoostingParams {
            n_estimators: 0,
            ..BoostingParams::default()
        };
        let model = GradientBoostedRegressor::fit(&x, &y, params).unwrap();
        let preds = model.predict(&matrix(vec![vec![0.3]])).unwrap();
        assert!((preds[0] - 500.0).abs() < 1e-9);
    }

    #[test]
    fn prediction_is_deterministic() {
        let (x, y) = step_data();
        let model = GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).unwrap();
        assert_eq!(model.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn rejects_wrong_width_at_inference() {
        let (x, y) = step_data();
        let model = GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).unwrap();

        let wide = matrix(vec![vec![0.0, 1.0]]);
        assert!(matches!(model.predict(&wide), Err(ModelError::Inference(_))));
    }

    #[test]
    fn empty_matrix_predicts_nothing() {
        let (x, y) = step_data();
        let model = GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).unwrap();

        let empty = FeatureMatrix::from_rows(vec!["f0".to_owned()], Vec::new()).unwrap();
        assert!(model.predict(&empty).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_training_input() {
        let (x, _) = step_data();
        assert!(GradientBoostedRegressor::fit(&x, &[1.0], BoostingParams::default()).is_err());
        assert!(
            GradientBoostedRegressor::fit(&FeatureMatrix::default(), &[], BoostingParams::default())
                .is_err()
        );

        let mut y = vec![0.0; 20];
        y[3] = f64::NAN;
        assert!(GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).is_err());

        let params = BoostingParams {
            max_depth: 0,
            ..BoostingParams::default()
        };
        assert!(GradientBoostedRegressor::fit(&x, &[0.0; 20], params).is_err());
    }

    #[test]
    fn reports_progress_per_round() {
        let (x, y) = step_data();
        let params = BoostingParams {
            n_estimators: 5,
            ..BoostingParams::default()
        };
        let mut rounds = Vec::new();
        GradientBoostedRegressor::fit_with_progress(&x, &y, params, |r| rounds.push(r)).unwrap();
        assert_eq!(rounds, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn validate_accepts_fitted_model() {
        let (x, y) = step_data();
        let model = GradientBoostedRegressor::fit(&x, &y, BoostingParams::default()).unwrap();
        assert!(model.validate().is_ok());
        assert_eq!(model.n_trees(), 200);
        assert_eq!(model.n_features(), 1);
    }

    #[test]
    fn survives_json_roundtrip() {
        let (x, y) = step_data();
        let params = BoostingParams {
            n_estimators: 10,
            ..BoostingParams::default()
        };
        let model = GradientBoostedRegressor::fit(&x, &y, params).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: GradientBoostedRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.n_trees(), 10);
        for (a, b) in model.predict(&x).unwrap().iter().zip(restored.predict(&x).unwrap()) {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }
}
