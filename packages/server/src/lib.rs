#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for AdSpecta location recommendations.
//!
//! Exposes `POST /predict`, which ranks nearby advertising locations for a
//! requester, and `GET /health`. The model bundle is loaded once at startup
//! and shared read-only across workers. The candidate CSV is re-read on
//! every request, so edits to it take effect without a restart.

pub mod config;
mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use adspecta_model::{ImpressionModel, ModelBundle, ModelError};
use adspecta_scoring::ScoringPipeline;

pub use config::ServerConfig;

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A required file or setting is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model bundle could not be loaded.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The HTTP server failed to bind or run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Scoring pipeline holding the shared model.
    pub pipeline: ScoringPipeline,
    /// Candidate location CSV.
    pub dataset_path: PathBuf,
}

impl AppState {
    #[must_use]
    pub fn new(model: Arc<dyn ImpressionModel>, dataset_path: PathBuf) -> Self {
        Self {
            pipeline: ScoringPipeline::new(model),
            dataset_path,
        }
    }

    /// Loads the model bundle and checks the dataset is present.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Model`] if the bundle is missing or malformed,
    /// or [`ServerError::Configuration`] if the dataset file does not exist.
    pub fn load(config: &ServerConfig) -> Result<Self, ServerError> {
        log::info!("Loading model bundle from {}...", config.model_path.display());
        let bundle = ModelBundle::load(&config.model_path)?;
        log::debug!("Model columns: {}", bundle.feature_columns.join(", "));

        if !config.dataset_path.exists() {
            return Err(ServerError::Configuration(format!(
                "Adspace CSV not found: {}",
                config.dataset_path.display()
            )));
        }

        Ok(Self::new(Arc::new(bundle), config.dataset_path.clone()))
    }
}

/// Registers the API routes and the JSON body configuration.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .route("/predict", web::post().to(handlers::predict))
        .route("/health", web::get().to(handlers::health));
}

/// Starts the AdSpecta API server.
///
/// Reads [`ServerConfig`] from the environment, loads the model bundle,
/// and runs the Actix-Web HTTP server. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns a [`ServerError`] if the model or dataset is unavailable, or if
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    let state = web::Data::new(AppState::load(&config)?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use adspecta_model::{BoostingParams, FeatureMatrix, GradientBoostedRegressor, ScalerSnapshot};
    use adspecta_scoring::ScoringError;
    use adspecta_server_models::PredictRequest;

    use super::*;

    fn config(name: &str) -> ServerConfig {
        let dir = std::env::temp_dir().join(format!("adspecta_server_state_{name}"));
        ServerConfig {
            bind_addr: config::DEFAULT_BIND_ADDR.to_string(),
            port: config::DEFAULT_PORT,
            dataset_path: dir.join("adspaces.csv"),
            model_path: dir.join("bundle.json"),
        }
    }

    fn write_bundle(path: &std::path::Path) {
        let matrix = FeatureMatrix::from_rows(
            vec!["a".to_string()],
            vec![vec![0.0], vec![1.0]],
        )
        .unwrap();
        let model = GradientBoostedRegressor::fit(
            &matrix,
            &[10.0, 20.0],
            BoostingParams {
                n_estimators: 2,
                ..BoostingParams::default()
            },
        )
        .unwrap();
        let scaler = ScalerSnapshot {
            min: vec![0.0],
            max: vec![1.0],
        };
        ModelBundle::new(model, vec!["a".to_string()], scaler)
            .save(path)
            .unwrap();
    }

    #[test]
    fn missing_model_is_fatal() {
        let config = config("missing_model");
        let _ = std::fs::remove_file(&config.model_path);

        let err = AppState::load(&config).unwrap_err();
        assert!(matches!(err, ServerError::Model(ModelError::Unavailable { .. })));
    }

    #[test]
    fn missing_dataset_is_fatal() {
        let config = config("missing_dataset");
        write_bundle(&config.model_path);
        let _ = std::fs::remove_file(&config.dataset_path);

        let err = AppState::load(&config).unwrap_err();
        assert!(matches!(err, ServerError::Configuration(_)));

        let _ = std::fs::remove_file(&config.model_path);
    }

    #[test]
    fn loads_state_when_files_exist() {
        let config = config("ok");
        write_bundle(&config.model_path);
        std::fs::write(
            &config.dataset_path,
            "id,name,lat,lng,type,price_per_month\n1,A,0,0,billboard,10\n",
        )
        .unwrap();

        let state = AppState::load(&config).unwrap();
        assert_eq!(state.dataset_path, config.dataset_path);

        let _ = std::fs::remove_file(&config.model_path);
        let _ = std::fs::remove_file(&config.dataset_path);
    }

    #[test]
    fn served_model_checks_feature_columns() {
        let config = config("columns");
        write_bundle(&config.model_path);
        std::fs::write(
            &config.dataset_path,
            "id,name,lat,lng,type,price_per_month\n1,A,0,0,billboard,10\n",
        )
        .unwrap();

        let state = AppState::load(&config).unwrap();
        let request: PredictRequest =
            serde_json::from_str(r#"{"lat": 0.0, "lng": 0.0, "budget": 100.0}"#).unwrap();
        let err = state
            .pipeline
            .rank_from_path(&state.dataset_path, &request.to_query())
            .unwrap_err();
        assert!(
            matches!(err, ScoringError::Inference(ModelError::Inference(_))),
            "{err}"
        );
        assert!(err.to_string().contains("trained columns [a]"), "{err}");

        let _ = std::fs::remove_file(&config.model_path);
        let _ = std::fs::remove_file(&config.dataset_path);
    }
}
