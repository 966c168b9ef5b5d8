//! Feature construction for the impressions model.
//!
//! Missing optional attributes are filled from [`FILL_DEFAULTS`], four
//! derived features are computed, and every column is min-max scaled to
//! `[0, 1]` over the current candidate set. The scaler is fitted per call
//! and never shared, so the scale of a feature depends on which candidates
//! survived filtering for that request.

use std::collections::{BTreeMap, BTreeSet};

use adspecta_location_models::{Candidate, NumericColumn};
use adspecta_model::{FeatureMatrix, ScalerSnapshot};

use crate::ScoringError;

/// How a missing value in an optional column is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillDefault {
    /// A fixed value.
    Constant(f64),
    /// The first present value in the candidate set, or zero if no
    /// candidate has one.
    FirstPresent,
}

/// Defaults for optional columns. Columns not listed stay missing and end
/// up as zero in the feature matrix.
pub const FILL_DEFAULTS: &[(NumericColumn, FillDefault)] = &[
    (NumericColumn::HistoryImpressions, FillDefault::Constant(0.0)),
    (NumericColumn::HistoryCtr, FillDefault::Constant(0.0)),
    (NumericColumn::NearbyColleges, FillDefault::Constant(0.0)),
    (NumericColumn::NearbyItOffices, FillDefault::Constant(0.0)),
    (NumericColumn::NearbyMalls, FillDefault::Constant(0.0)),
    (NumericColumn::NearbyBusStops, FillDefault::Constant(0.0)),
    (NumericColumn::PedestrianPerHour, FillDefault::Constant(0.0)),
    (NumericColumn::VehiclePerHour, FillDefault::Constant(0.0)),
    (NumericColumn::AvgDwellTimeMin, FillDefault::Constant(0.0)),
    (NumericColumn::AvgIncomeArea, FillDefault::FirstPresent),
    (NumericColumn::IsNightActive, FillDefault::Constant(0.0)),
    (NumericColumn::DigitalBrightness, FillDefault::Constant(0.0)),
    (NumericColumn::DominantGenderMalePct, FillDefault::Constant(50.0)),
    (NumericColumn::OwnerRating, FillDefault::Constant(3.0)),
];

/// Names of the derived feature columns, appended after the raw columns.
pub const DERIVED_COLUMNS: [&str; 4] = [
    "price_value_score",
    "combined_vis",
    "ped_vehicle_ratio",
    "income_norm",
];

/// Income score used when the dataset has no income column at all.
const DEFAULT_INCOME_NORM: f64 = 0.5;

/// Synthetic features computed from a candidate's (defaulted) attributes.
///
/// A value is `NaN` when one of its inputs was missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    /// Cheaper relative to the most expensive candidate scores higher.
    pub price_value_score: f64,
    pub combined_vis: f64,
    pub ped_vehicle_ratio: f64,
    pub income_norm: f64,
}

impl DerivedFeatures {
    const fn values(&self) -> [f64; 4] {
        [
            self.price_value_score,
            self.combined_vis,
            self.ped_vehicle_ratio,
            self.income_norm,
        ]
    }
}

/// A candidate with defaults applied and derived features attached.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// The candidate; missing values in available columns that have a
    /// default were filled in.
    pub candidate: Candidate,
    pub derived: DerivedFeatures,
}

/// Output of [`build_features`]: the scaled matrix and the unscaled rows,
/// aligned by index.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub matrix: FeatureMatrix,
    pub rows: Vec<FeatureRow>,
    /// Column bounds used for scaling, before scaling was applied.
    pub bounds: ScalerSnapshot,
}

/// Resolves [`FILL_DEFAULTS`] against a candidate set.
#[must_use]
pub fn resolve_defaults(candidates: &[Candidate]) -> BTreeMap<NumericColumn, f64> {
    FILL_DEFAULTS
        .iter()
        .map(|(column, default)| {
            let value = match default {
                FillDefault::Constant(value) => *value,
                FillDefault::FirstPresent => candidates
                    .iter()
                    .find_map(|c| c.record.value(*column))
                    .unwrap_or(0.0),
            };
            (*column, value)
        })
        .collect()
}

/// Builds the scaled feature matrix for a candidate set.
///
/// `available` is the set of numeric columns present in the dataset; only
/// those become raw feature columns, in canonical order, followed by
/// [`DERIVED_COLUMNS`].
///
/// # Errors
///
/// Returns [`ScoringError::Feature`] if there are no candidates or the
/// matrix cannot be assembled.
pub fn build_features(
    available: &BTreeSet<NumericColumn>,
    candidates: Vec<Candidate>,
) -> Result<FeatureSet, ScoringError> {
    if candidates.is_empty() {
        return Err(ScoringError::Feature(
            "Feature engineering produced no rows".to_owned(),
        ));
    }

    let defaults = resolve_defaults(&candidates);
    let columns: Vec<NumericColumn> = NumericColumn::all()
        .iter()
        .copied()
        .filter(|c| available.contains(c))
        .collect();

    let rows: Vec<FeatureRow> = {
        let filled: Vec<Candidate> = candidates
            .into_iter()
            .map(|candidate| fill_defaults(candidate, &columns, &defaults))
            .collect();
        let derived = derive_features(&filled, available, &defaults);
        filled
            .into_iter()
            .zip(derived)
            .map(|(candidate, derived)| FeatureRow { candidate, derived })
            .collect()
    };

    let raw: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.candidate.record.value(*c).unwrap_or(f64::NAN))
                .chain(row.derived.values())
                .map(|v| if v.is_finite() { v } else { 0.0 })
                .collect()
        })
        .collect();

    let (scaled, bounds) = min_max_scale(raw);

    let names: Vec<String> = columns
        .iter()
        .map(|c| c.as_ref().to_owned())
        .chain(DERIVED_COLUMNS.iter().map(|&n| n.to_owned()))
        .collect();

    let matrix = FeatureMatrix::from_rows(names, scaled)
        .map_err(|e| ScoringError::Feature(e.to_string()))?;

    log::debug!(
        "Built feature matrix: {} rows x {} columns",
        matrix.n_rows(),
        matrix.n_cols()
    );

    Ok(FeatureSet {
        matrix,
        rows,
        bounds,
    })
}

/// Fits a min-max scaler to `rows` and transforms them in one step.
///
/// Each column is mapped to `[0, 1]` using its own min and max. A constant
/// column maps to zero. Returns the scaled rows and the fitted bounds.
#[must_use]
pub fn min_max_scale(mut rows: Vec<Vec<f64>>) -> (Vec<Vec<f64>>, ScalerSnapshot) {
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut bounds = ScalerSnapshot {
        min: vec![f64::INFINITY; n_cols],
        max: vec![f64::NEG_INFINITY; n_cols],
    };

    for row in &rows {
        for (j, v) in row.iter().enumerate() {
            bounds.min[j] = bounds.min[j].min(*v);
            bounds.max[j] = bounds.max[j].max(*v);
        }
    }

    for row in &mut rows {
        for (j, v) in row.iter_mut().enumerate() {
            let range = bounds.max[j] - bounds.min[j];
            *v = if range > 0.0 {
                (*v - bounds.min[j]) / range
            } else {
                0.0
            };
        }
    }

    (rows, bounds)
}

fn fill_defaults(
    mut candidate: Candidate,
    columns: &[NumericColumn],
    defaults: &BTreeMap<NumericColumn, f64>,
) -> Candidate {
    for column in columns {
        if let Some(default) = defaults.get(column) {
            candidate
                .record
                .attributes
                .entry(*column)
                .or_insert(*default);
        }
    }
    candidate
}

fn derive_features(
    candidates: &[Candidate],
    available: &BTreeSet<NumericColumn>,
    defaults: &BTreeMap<NumericColumn, f64>,
) -> Vec<DerivedFeatures> {
    let value = |c: &Candidate, column: NumericColumn| {
        c.record
            .value(column)
            .or_else(|| defaults.get(&column).copied())
            .unwrap_or(f64::NAN)
    };

    let max_price = max_of(candidates.iter().map(|c| c.record.price_per_month));
    let has_income = available.contains(&NumericColumn::AvgIncomeArea);
    let max_income = max_of(
        candidates
            .iter()
            .map(|c| value(c, NumericColumn::AvgIncomeArea)),
    );

    candidates
        .iter()
        .map(|c| DerivedFeatures {
            price_value_score: 1.0 - c.record.price_per_month / (max_price + 1.0),
            combined_vis: value(c, NumericColumn::VisibilityScore) * 0.5
                + value(c, NumericColumn::LandmarkScore) * 0.3
                + (value(c, NumericColumn::DigitalBrightness) / 100.0) * 0.2,
            ped_vehicle_ratio: value(c, NumericColumn::PedestrianPerHour)
                / (value(c, NumericColumn::VehiclePerHour) + 1.0),
            income_norm: if has_income {
                value(c, NumericColumn::AvgIncomeArea) / (max_income + 1.0)
            } else {
                DEFAULT_INCOME_NORM
            },
        })
        .collect()
}

/// Maximum of the non-`NaN` values, or `NaN` if there are none.
fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| !v.is_nan()).fold(f64::NAN, f64::max)
}
