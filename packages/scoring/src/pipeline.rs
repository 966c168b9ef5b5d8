//! End-to-end scoring of one recommendation request.

use std::path::Path;
use std::sync::Arc;

use adspecta_dataset::LocationDataset;
use adspecta_location_models::{AdQuery, RankedLocation};
use adspecta_model::{ImpressionModel, ModelError};
use adspecta_spatial::GeoFilter;

use crate::ScoringError;
use crate::audience::audience_match;
use crate::budget::within_budget;
use crate::features::{FeatureRow, FeatureSet, build_features};
use crate::normalize::{ad_scores, predicted_impressions};
use crate::ranking::{final_score, rank};

/// Runs the full filter → features → model → ranking pipeline against an
/// injected, read-only impressions model.
#[derive(Clone)]
pub struct ScoringPipeline {
    model: Arc<dyn ImpressionModel>,
}

struct ScoredRow {
    row: FeatureRow,
    prediction: f64,
    adscore: f64,
}

impl ScoringPipeline {
    /// Creates a pipeline that searches within
    /// [`adspecta_spatial::DEFAULT_RADIUS_KM`] of the requester.
    #[must_use]
    pub const fn new(model: Arc<dyn ImpressionModel>) -> Self {
        Self { model }
    }

    /// Loads the dataset from `path` and ranks it for `query`.
    ///
    /// The dataset is read fresh on every call.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Dataset`] if the dataset cannot be loaded, or
    /// any error from [`Self::rank`].
    pub fn rank_from_path(
        &self,
        path: &Path,
        query: &AdQuery,
    ) -> Result<Vec<RankedLocation>, ScoringError> {
        let dataset = LocationDataset::from_path(path)?;
        self.rank(&dataset, query)
    }

    /// Ranks the dataset's locations for `query`.
    ///
    /// # Errors
    ///
    /// * [`ScoringError::NoMatches`] if no location is within the radius
    ///   and of the requested type
    /// * [`ScoringError::Feature`] if the feature matrix cannot be built
    /// * [`ScoringError::Inference`] if the model fails or returns unusable
    ///   predictions
    /// * [`ScoringError::OverBudget`] if every remaining location costs more
    ///   than the budget
    pub fn rank(
        &self,
        dataset: &LocationDataset,
        query: &AdQuery,
    ) -> Result<Vec<RankedLocation>, ScoringError> {
        let candidates = GeoFilter::new(query.lat, query.lng)
            .with_category(query.type_filter())
            .apply(&dataset.records);

        if candidates.is_empty() {
            return Err(ScoringError::NoMatches);
        }

        let FeatureSet { matrix, rows, .. } = build_features(&dataset.available, candidates)?;

        let predictions = self
            .model
            .predict(&matrix)
            .map_err(ScoringError::Inference)?;
        check_predictions(&predictions, rows.len())?;

        log::debug!(
            "Model '{}' scored {} candidates",
            self.model.name(),
            predictions.len()
        );

        let adscores = ad_scores(&predictions);
        let scored: Vec<ScoredRow> = rows
            .into_iter()
            .zip(predictions)
            .zip(adscores)
            .map(|((row, prediction), adscore)| ScoredRow {
                row,
                prediction,
                adscore,
            })
            .collect();

        let affordable = within_budget(scored, query.budget, |s| {
            s.row.candidate.record.price_per_month
        });
        if affordable.is_empty() {
            return Err(ScoringError::OverBudget);
        }

        let results = rank(
            affordable
                .into_iter()
                .map(|scored| to_ranked(scored, query))
                .collect(),
        );

        log::debug!("Returning {} recommendations", results.len());
        Ok(results)
    }
}

impl std::fmt::Debug for ScoringPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringPipeline")
            .field("model", &self.model.name())
            .finish()
    }
}

fn check_predictions(predictions: &[f64], rows: usize) -> Result<(), ScoringError> {
    if predictions.len() != rows {
        return Err(ScoringError::Inference(ModelError::Inference(format!(
            "model returned {} predictions for {rows} rows",
            predictions.len()
        ))));
    }
    if let Some(i) = predictions.iter().position(|p| !p.is_finite()) {
        return Err(ScoringError::Inference(ModelError::Inference(format!(
            "prediction {i} is not finite: {}",
            predictions[i]
        ))));
    }
    Ok(())
}

fn to_ranked(scored: ScoredRow, query: &AdQuery) -> RankedLocation {
    let ScoredRow {
        row,
        prediction,
        adscore,
    } = scored;
    let audience = audience_match(&row.candidate.record, query);
    let record = row.candidate.record;

    RankedLocation {
        id: record.id,
        name: record.name,
        lat: record.lat,
        lng: record.lng,
        category: record.category,
        price_per_month: record.price_per_month,
        predicted_impressions: predicted_impressions(prediction),
        adscore,
        audience_match: audience,
        final_score: final_score(adscore, audience),
        distance_km: row.candidate.distance_km,
    }
}
