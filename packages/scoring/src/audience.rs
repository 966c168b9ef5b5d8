//! Rule-based audience affinity scoring.
//!
//! The score is an unbounded, additive sum of weighted location attributes.
//! Young audiences favour footfall, each segment favours its own
//! attributes, and traffic always contributes.

use adspecta_location_models::{AdQuery, AudienceSegment, LocationRecord, NumericColumn};

/// Audiences whose minimum age is at or below this get the footfall bonus.
pub const YOUTH_AGE_THRESHOLD: i32 = 25;

const YOUTH_FOOTFALL_WEIGHT: f64 = 0.2;
const TRAFFIC_WEIGHT: f64 = 0.1;

/// Attribute weights added for each audience segment.
#[must_use]
pub const fn segment_weights(segment: AudienceSegment) -> &'static [(NumericColumn, f64)] {
    match segment {
        AudienceSegment::Students => &[
            (NumericColumn::LandmarkScore, 0.3),
            (NumericColumn::BusinessDensity, 0.1),
        ],
        AudienceSegment::ItWorkers => &[
            (NumericColumn::BusinessDensity, 0.3),
            (NumericColumn::VisibilityScore, 0.1),
        ],
        AudienceSegment::Shoppers => &[(NumericColumn::LandmarkScore, 0.4)],
        AudienceSegment::Residents => &[(NumericColumn::PopulationDensity, 0.4)],
        AudienceSegment::Tourists => &[(NumericColumn::LandmarkScore, 0.5)],
        AudienceSegment::General => &[],
    }
}

/// Scores how well a location fits the requested audience. Missing
/// attributes contribute nothing.
#[must_use]
pub fn audience_match(record: &LocationRecord, query: &AdQuery) -> f64 {
    let mut score = 0.0;

    if query.audience_age_min <= YOUTH_AGE_THRESHOLD {
        score += record.value_or_zero(NumericColumn::FootfallScore) * YOUTH_FOOTFALL_WEIGHT;
    }

    score += segment_weights(query.audience)
        .iter()
        .map(|(column, weight)| record.value_or_zero(*column) * weight)
        .sum::<f64>();

    score += record.value_or_zero(NumericColumn::TrafficScore) * TRAFFIC_WEIGHT;

    score
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn record() -> LocationRecord {
        LocationRecord {
            id: "1".to_owned(),
            name: "Brigade Road".to_owned(),
            lat: 0.0,
            lng: 0.0,
            category: "billboard".to_owned(),
            price_per_month: 1000.0,
            attributes: BTreeMap::from([
                (NumericColumn::FootfallScore, 0.9),
                (NumericColumn::LandmarkScore, 0.8),
                (NumericColumn::BusinessDensity, 0.6),
                (NumericColumn::VisibilityScore, 0.7),
                (NumericColumn::PopulationDensity, 0.5),
                (NumericColumn::TrafficScore, 0.4),
            ]),
            avg_monthly_impressions: None,
        }
    }

    fn query(segment: AudienceSegment, age_min: i32) -> AdQuery {
        AdQuery::new(0.0, 0.0, 5000.0)
            .with_audience(segment)
            .with_age_range(age_min, 60)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn general_adults_only_get_traffic() {
        let score = audience_match(&record(), &query(AudienceSegment::General, 30));
        assert!(close(score, 0.4 * 0.1));
    }

    #[test]
    fn young_audiences_get_footfall_bonus() {
        let young = audience_match(&record(), &query(AudienceSegment::General, 25));
        let adult = audience_match(&record(), &query(AudienceSegment::General, 26));
        assert!(close(young - adult, 0.9 * 0.2));
    }

    #[test]
    fn segment_bonuses() {
        let base = audience_match(&record(), &query(AudienceSegment::General, 30));
        let bonus = |segment| audience_match(&record(), &query(segment, 30)) - base;

        assert!(close(bonus(AudienceSegment::Students), 0.8 * 0.3 + 0.6 * 0.1));
        assert!(close(bonus(AudienceSegment::ItWorkers), 0.6 * 0.3 + 0.7 * 0.1));
        assert!(close(bonus(AudienceSegment::Shoppers), 0.8 * 0.4));
        assert!(close(bonus(AudienceSegment::Residents), 0.5 * 0.4));
        assert!(close(bonus(AudienceSegment::Tourists), 0.8 * 0.5));
    }

    #[test]
    fn unknown_segment_scores_like_general() {
        let unknown = AdQuery::new(0.0, 0.0, 5000.0)
            .with_audience(AudienceSegment::from_tag("astronauts"));
        let general = AdQuery::new(0.0, 0.0, 5000.0);
        assert!(close(
            audience_match(&record(), &unknown),
            audience_match(&record(), &general)
        ));
    }

    #[test]
    fn missing_attributes_score_zero() {
        let mut bare = record();
        bare.attributes.clear();
        for segment in AudienceSegment::all() {
            assert!(close(audience_match(&bare, &query(*segment, 18)), 0.0));
        }
    }
}
