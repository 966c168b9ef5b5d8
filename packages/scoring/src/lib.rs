#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature engineering and ranking pipeline for advertising location
//! recommendations.
//!
//! A request flows through the stages in this order:
//!
//! 1. radius and type filter ([`adspecta_spatial::GeoFilter`])
//! 2. feature construction ([`features`])
//! 3. model inference ([`adspecta_model::ImpressionModel`])
//! 4. ad score normalization ([`normalize`])
//! 5. budget filter ([`budget`])
//! 6. audience matching ([`audience`])
//! 7. weighted combination and ranking ([`ranking`])
//!
//! [`pipeline::ScoringPipeline`] wires the stages together. Any stage
//! failure aborts the request; partial results are never returned.

pub mod audience;
pub mod budget;
pub mod features;
pub mod normalize;
pub mod pipeline;
pub mod ranking;

use adspecta_dataset::DatasetError;
use adspecta_model::ModelError;

pub use pipeline::ScoringPipeline;

/// Errors that can occur while scoring a request.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// No location is within the radius and matches the requested type.
    #[error("No adspaces match your filters")]
    NoMatches,

    /// Every matching location costs more than the budget.
    #[error("No adspaces fit your budget")]
    OverBudget,

    /// The feature matrix could not be built.
    #[error("{0}")]
    Feature(String),

    /// The model failed to produce usable predictions.
    #[error(transparent)]
    Inference(ModelError),

    /// The candidate dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl ScoringError {
    /// Returns `true` for the "no candidates left" conditions, as opposed to
    /// internal failures.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NoMatches | Self::OverBudget)
    }
}
