//! Training label selection.
//!
//! Datasets without recorded impressions get a pseudo-label derived from
//! the location's traffic, footfall, landmark and visibility scores,
//! weighted by how dense the surrounding population is relative to the
//! densest location in the dataset.

use adspecta_location_models::{LocationRecord, NumericColumn};

/// Weights of the pseudo-label components.
const PSEUDO_LABEL_WEIGHTS: &[(NumericColumn, f64)] = &[
    (NumericColumn::TrafficScore, 0.3),
    (NumericColumn::FootfallScore, 0.3),
    (NumericColumn::LandmarkScore, 0.2),
    (NumericColumn::VisibilityScore, 0.2),
];

/// Scale from the weighted score to impressions.
const PSEUDO_LABEL_SCALE: f64 = 1000.0;

/// Synthesizes impressions labels from location attributes. Missing
/// attributes count as zero.
#[must_use]
pub fn pseudo_labels(records: &[LocationRecord]) -> Vec<f64> {
    let max_density = records
        .iter()
        .filter_map(|r| r.value(NumericColumn::PopulationDensity))
        .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))))
        .unwrap_or(0.0);

    records
        .iter()
        .map(|record| {
            let weighted: f64 = PSEUDO_LABEL_WEIGHTS
                .iter()
                .map(|(column, weight)| record.value_or_zero(*column) * weight)
                .sum();
            let density =
                record.value_or_zero(NumericColumn::PopulationDensity) / (max_density + 1.0);

            (weighted * density * PSEUDO_LABEL_SCALE).round_ties_even()
        })
        .collect()
}

/// Returns the labels to train on: recorded impressions (missing as zero)
/// when available, pseudo-labels otherwise.
#[must_use]
pub fn training_labels(records: &[LocationRecord], labels_missing: bool) -> Vec<f64> {
    if labels_missing {
        log::warn!("No historical impressions found, creating pseudo-labels");
        return pseudo_labels(records);
    }

    records
        .iter()
        .map(|r| r.avg_monthly_impressions.unwrap_or(0.0))
        .collect()
}
