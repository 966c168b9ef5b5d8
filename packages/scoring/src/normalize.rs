//! Conversion of raw model predictions into 0-100 ad scores.

/// Score assigned to every row when all predictions are identical.
pub const NEUTRAL_AD_SCORE: f64 = 50.0;

/// Min-max scales predictions to `0..=100`, rounded to one decimal.
///
/// The lowest prediction maps to 0.0 and the highest to 100.0. If every
/// prediction is the same, every row gets [`NEUTRAL_AD_SCORE`].
#[must_use]
pub fn ad_scores(predictions: &[f64]) -> Vec<f64> {
    let min = predictions.iter().copied().fold(f64::INFINITY, f64::min);
    let max = predictions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range == 0.0 || !range.is_finite() {
        return vec![NEUTRAL_AD_SCORE; predictions.len()];
    }

    predictions
        .iter()
        .map(|p| round_to_tenth((p - min) / range * 100.0))
        .collect()
}

/// Rounds a raw prediction to a whole number of impressions, half to even.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn predicted_impressions(prediction: f64) -> i64 {
    prediction.round_ties_even() as i64
}

/// Rounds to one decimal place, half to even.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
