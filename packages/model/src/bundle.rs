//! Persisted model bundle.
//!
//! A bundle is a single JSON document holding the fitted regressor, the
//! feature column names it was trained on, and the per-column bounds
//! observed at training time. The bounds are kept for provenance only:
//! inference rescales every request against its own candidate set.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FeatureMatrix, GradientBoostedRegressor, ImpressionModel, ModelError};

/// Current on-disk format version.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Per-column min/max observed when the model was trained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerSnapshot {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Everything needed to serve predictions, as written by the trainer.
///
/// Serving through the bundle rather than the bare regressor checks that a
/// request's feature columns are the ones the model was trained on.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    /// Feature column names in matrix order.
    pub feature_columns: Vec<String>,
    pub scaler: ScalerSnapshot,
    pub model: GradientBoostedRegressor,
}

impl ModelBundle {
    /// Wraps a freshly trained model.
    #[must_use]
    pub fn new(
        model: GradientBoostedRegressor,
        feature_columns: Vec<String>,
        scaler: ScalerSnapshot,
    ) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            trained_at: Utc::now(),
            feature_columns,
            scaler,
            model,
        }
    }

    /// Loads and validates a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Unavailable`] if the file is missing,
    /// unreadable, not valid JSON, or internally inconsistent.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let unavailable = |reason: String| ModelError::Unavailable {
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(unavailable("file not found".to_owned()));
        }

        let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
        let bundle: Self =
            serde_json::from_slice(&bytes).map_err(|e| unavailable(format!("malformed bundle: {e}")))?;

        bundle.validate().map_err(unavailable)?;

        log::info!(
            "Loaded model bundle from {} ({} trees, {} features, trained {})",
            path.display(),
            bundle.model.n_trees(),
            bundle.model.n_features(),
            bundle.trained_at.to_rfc3339()
        );

        Ok(bundle)
    }

    /// Writes the bundle as JSON, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Io`] or [`ModelError::Json`] on failure.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec(self)?;
        std::fs::write(path, json)?;

        log::info!("Model saved at {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<(), String> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {BUNDLE_FORMAT_VERSION})",
                self.format_version
            ));
        }

        let n = self.model.n_features();
        if self.feature_columns.len() != n {
            return Err(format!(
                "bundle lists {} feature columns but model expects {n}",
                self.feature_columns.len()
            ));
        }
        if self.scaler.min.len() != n || self.scaler.max.len() != n {
            return Err(format!("scaler bounds do not cover {n} features"));
        }

        self.model.validate()
    }
}

impl ImpressionModel for ModelBundle {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if features.columns() != self.feature_columns.as_slice() {
            return Err(ModelError::Inference(format!(
                "feature columns [{}] do not match trained columns [{}]",
                features.columns().join(", "),
                self.feature_columns.join(", ")
            )));
        }

        self.model.predict(features)
    }

    fn name(&self) -> &str {
        self.model.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoostingParams;

    fn trained_bundle() -> ModelBundle {
        let columns = vec!["a".to_owned(), "b".to_owned()];
        let x = FeatureMatrix::from_rows(
            columns.clone(),
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.5, 0.5]],
        )
        .unwrap();
        let params = BoostingParams {
            n_estimators: 10,
            ..BoostingParams::default()
        };
        let model = GradientBoostedRegressor::fit(&x, &[10.0, 20.0, 15.0], params).unwrap();
        ModelBundle::new(
            model,
            columns,
            ScalerSnapshot {
                min: vec![0.0, 0.0],
                max: vec![1.0, 1.0],
            },
        )
    }

    #[test]
    fn save_then_load_preserves_predictions() {
        let dir = std::env::temp_dir().join("adspecta_bundle_test_roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("bundle.json");

        let bundle = trained_bundle();
        bundle.save(&path).unwrap();
        let loaded = ModelBundle::load(&path).unwrap();

        let x = FeatureMatrix::from_rows(bundle.feature_columns.clone(), vec![vec![0.2, 0.8]])
            .unwrap();
        let before = bundle.predict(&x).unwrap();
        let after = loaded.predict(&x).unwrap();
        assert!((before[0] - after[0]).abs() < 1e-6, "{before:?} != {after:?}");
        assert_eq!(loaded.feature_columns, bundle.feature_columns);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rejects_columns_it_was_not_trained_on() {
        let columns = vec!["traffic_score".to_owned(), "owner_rating".to_owned()];
        let x = FeatureMatrix::from_rows(
            columns.clone(),
            vec![vec![0.9, 4.5], vec![0.1, 2.0], vec![0.5, 3.0]],
        )
        .unwrap();
        let params = BoostingParams {
            n_estimators: 5,
            ..BoostingParams::default()
        };
        let model = GradientBoostedRegressor::fit(&x, &[900.0, 100.0, 500.0], params).unwrap();
        let bundle = ModelBundle::new(
            model,
            columns,
            ScalerSnapshot {
                min: vec![0.0, 0.0],
                max: vec![1.0, 5.0],
            },
        );

        let renamed = FeatureMatrix::from_rows(
            vec!["size_m2".to_owned(), "history_ctr".to_owned()],
            vec![vec![0.9, 4.5]],
        )
        .unwrap();
        let err = bundle.predict(&renamed).unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)), "{err}");
        assert!(err.to_string().contains("size_m2"), "{err}");

        // Same names in a different order are also a mismatch.
        let swapped = FeatureMatrix::from_rows(
            vec!["owner_rating".to_owned(), "traffic_score".to_owned()],
            vec![vec![4.5, 0.9]],
        )
        .unwrap();
        assert!(bundle.predict(&swapped).is_err());

        assert_eq!(bundle.predict(&x).unwrap().len(), 3);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let path = std::env::temp_dir().join("adspecta_bundle_test_missing.json");
        let _ = std::fs::remove_file(&path);

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Unavailable { .. }));
    }

    #[test]
    fn malformed_file_is_unavailable() {
        let path = std::env::temp_dir().join("adspecta_bundle_test_malformed.json");
        std::fs::write(&path, br#"{"scaler": {}}"#).unwrap();

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(matches!(err, ModelError::Unavailable { .. }), "{err}");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn inconsistent_columns_are_rejected() {
        let path = std::env::temp_dir().join("adspecta_bundle_test_columns.json");
        let mut bundle = trained_bundle();
        bundle.feature_columns.push("extra".to_owned());
        bundle.save(&path).unwrap();

        let err = ModelBundle::load(&path).unwrap_err();
        assert!(err.to_string().contains("feature columns"), "{err}");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn future_format_version_is_rejected() {
        let path = std::env::temp_dir().join("adspecta_bundle_test_version.json");
        let mut bundle = trained_bundle();
        bundle.format_version = BUNDLE_FORMAT_VERSION + 1;
        bundle.save(&path).unwrap();

        assert!(ModelBundle::load(&path).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
