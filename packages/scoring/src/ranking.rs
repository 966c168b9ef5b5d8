//! Weighted combination of ad score and audience match, and final ranking.

use std::cmp::Ordering;

use adspecta_location_models::RankedLocation;

/// Weight of the model-derived ad score in the final score.
pub const AD_SCORE_WEIGHT: f64 = 0.7;

/// Weight of the audience match in the final score.
pub const AUDIENCE_WEIGHT: f64 = 0.3;

/// Maximum number of recommendations returned.
pub const MAX_RESULTS: usize = 10;

/// Blends the two scores into the value used for ranking.
#[must_use]
pub fn final_score(adscore: f64, audience_match: f64) -> f64 {
    adscore * AD_SCORE_WEIGHT + audience_match * AUDIENCE_WEIGHT
}

/// Ranking order: highest final score first, ties broken by id ascending.
#[must_use]
pub fn compare(a: &RankedLocation, b: &RankedLocation) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts rows into ranking order and keeps the top [`MAX_RESULTS`].
#[must_use]
pub fn rank(mut rows: Vec<RankedLocation>) -> Vec<RankedLocation> {
    rows.sort_by(compare);
    rows.truncate(MAX_RESULTS);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, final_score: f64) -> RankedLocation {
        RankedLocation {
            id: id.to_owned(),
            name: id.to_owned(),
            lat: 0.0,
            lng: 0.0,
            category: "billboard".to_owned(),
            price_per_month: 100.0,
            predicted_impressions: 0,
            adscore: 0.0,
            audience_match: 0.0,
            final_score,
            distance_km: 0.0,
        }
    }

    #[test]
    fn final_score_weights() {
        assert!((final_score(100.0, 0.0) - 70.0).abs() < 1e-12);
        assert!((final_score(0.0, 10.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn final_score_is_monotonic_in_each_input() {
        let steps = [0.0, 0.5, 1.0, 10.0, 50.0, 100.0];
        for fixed in steps {
            for pair in steps.windows(2) {
                assert!(final_score(pair[1], fixed) > final_score(pair[0], fixed));
                assert!(final_score(fixed, pair[1]) > final_score(fixed, pair[0]));
            }
        }
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let rows = (0..15).map(|i| row(&format!("{i:02}"), f64::from(i))).collect();
        let ranked = rank(rows);

        assert_eq!(ranked.len(), MAX_RESULTS);
        assert_eq!(ranked[0].id, "14");
        assert!(ranked.windows(2).all(|w| w[0].final_score >= w[1].final_score));
    }

    #[test]
    fn ties_break_by_id() {
        let ranked = rank(vec![row("c", 5.0), row("a", 5.0), row("b", 7.0)]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
