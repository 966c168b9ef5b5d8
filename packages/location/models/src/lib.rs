#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Advertising location, query, and ranking result types.
//!
//! This crate defines the data shared by every stage of the recommendation
//! pipeline: the per-location record loaded from the candidate dataset, the
//! numeric attribute taxonomy used for feature construction, the audience
//! segments a requester can target, and the ranked row produced at the end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default lower bound of the requested audience age range.
pub const DEFAULT_AUDIENCE_AGE_MIN: i32 = 18;

/// Default upper bound of the requested audience age range.
pub const DEFAULT_AUDIENCE_AGE_MAX: i32 = 60;

/// Numeric location attributes consumed by the impressions model.
///
/// The declaration order is the canonical feature column order. Training and
/// inference both build their matrices in this order, so new variants must
/// only ever be appended.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NumericColumn {
    /// Listed monthly price.
    PricePerMonth,
    /// Display surface area in square meters.
    #[serde(rename = "size_m2")]
    #[strum(serialize = "size_m2")]
    SizeM2,
    VisibilityScore,
    NightVisibility,
    TrafficScore,
    FootfallScore,
    BusinessDensity,
    PopulationDensity,
    LandmarkScore,
    /// Historical impressions recorded for the location, if any.
    HistoryImpressions,
    /// Historical click-through rate, if any.
    HistoryCtr,
    NearbyColleges,
    NearbyItOffices,
    NearbyMalls,
    NearbyBusStops,
    PedestrianPerHour,
    VehiclePerHour,
    AvgDwellTimeMin,
    AvgIncomeArea,
    IsNightActive,
    /// Brightness of a digital display, 0-100.
    DigitalBrightness,
    DominantGenderMalePct,
    OwnerRating,
}

impl NumericColumn {
    /// Returns all variants in canonical feature order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PricePerMonth,
            Self::SizeM2,
            Self::VisibilityScore,
            Self::NightVisibility,
            Self::TrafficScore,
            Self::FootfallScore,
            Self::BusinessDensity,
            Self::PopulationDensity,
            Self::LandmarkScore,
            Self::HistoryImpressions,
            Self::HistoryCtr,
            Self::NearbyColleges,
            Self::NearbyItOffices,
            Self::NearbyMalls,
            Self::NearbyBusStops,
            Self::PedestrianPerHour,
            Self::VehiclePerHour,
            Self::AvgDwellTimeMin,
            Self::AvgIncomeArea,
            Self::IsNightActive,
            Self::DigitalBrightness,
            Self::DominantGenderMalePct,
            Self::OwnerRating,
        ]
    }
}

/// Audience segment a requester wants to reach.
///
/// Parsing is case-insensitive. Unknown tags fall back to [`Self::General`]
/// through [`AudienceSegment::from_tag`].
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AudienceSegment {
    Students,
    ItWorkers,
    Shoppers,
    Residents,
    Tourists,
    #[default]
    General,
}

impl AudienceSegment {
    /// Parses a segment tag case-insensitively, treating anything
    /// unrecognised as [`Self::General`]. Surrounding whitespace is not
    /// stripped.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Students,
            Self::ItWorkers,
            Self::Shoppers,
            Self::Residents,
            Self::Tourists,
            Self::General,
        ]
    }
}

/// One advertisable physical location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Unique location identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Location type tag (billboard, digital screen, ...).
    pub category: String,
    /// Listed monthly price.
    pub price_per_month: f64,
    /// Optional numeric attributes that were present for this row.
    ///
    /// [`NumericColumn::PricePerMonth`] is never stored here; it lives in
    /// [`Self::price_per_month`].
    pub attributes: BTreeMap<NumericColumn, f64>,
    /// Average monthly impressions, used only as a training label.
    pub avg_monthly_impressions: Option<f64>,
}

impl LocationRecord {
    /// Returns the value of a numeric column for this row, or `None` if it
    /// was missing.
    #[must_use]
    pub fn value(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::PricePerMonth => Some(self.price_per_month),
            other => self.attributes.get(&other).copied(),
        }
    }

    /// Returns the value of a numeric column, treating a missing value as
    /// zero.
    #[must_use]
    pub fn value_or_zero(&self, column: NumericColumn) -> f64 {
        self.value(column).unwrap_or(0.0)
    }
}

/// A location that survived the radius filter, with its distance from the
/// requester.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// The underlying location.
    pub record: LocationRecord,
    /// Great-circle distance from the requester in kilometers.
    pub distance_km: f64,
}

/// A single recommendation request.
#[derive(Debug, Clone, PartialEq)]
pub struct AdQuery {
    /// Requester latitude in degrees.
    pub lat: f64,
    /// Requester longitude in degrees.
    pub lng: f64,
    /// Maximum monthly price the requester will pay.
    pub budget: f64,
    pub audience_age_min: i32,
    pub audience_age_max: i32,
    /// Targeted audience segment.
    pub audience: AudienceSegment,
    /// Restrict results to this location type (case-insensitive).
    pub preferred_type: Option<String>,
}

impl AdQuery {
    /// Creates a query with default audience parameters and no type filter.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, budget: f64) -> Self {
        Self {
            lat,
            lng,
            budget,
            audience_age_min: DEFAULT_AUDIENCE_AGE_MIN,
            audience_age_max: DEFAULT_AUDIENCE_AGE_MAX,
            audience: AudienceSegment::General,
            preferred_type: None,
        }
    }

    /// Sets the targeted audience segment.
    #[must_use]
    pub const fn with_audience(mut self, audience: AudienceSegment) -> Self {
        self.audience = audience;
        self
    }

    /// Sets the audience age range.
    #[must_use]
    pub const fn with_age_range(mut self, min: i32, max: i32) -> Self {
        self.audience_age_min = min;
        self.audience_age_max = max;
        self
    }

    /// Restricts results to a location type.
    #[must_use]
    pub fn with_preferred_type(mut self, preferred_type: &str) -> Self {
        self.preferred_type = Some(preferred_type.to_owned());
        self
    }

    /// Returns the type filter. An empty string means no filter; any other
    /// value, whitespace included, is matched as given.
    #[must_use]
    pub fn type_filter(&self) -> Option<&str> {
        self.preferred_type.as_deref().filter(|t| !t.is_empty())
    }
}

/// A scored recommendation, as produced by the ranking stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLocation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: String,
    pub price_per_month: f64,
    /// Raw model prediction rounded to a whole number of impressions.
    pub predicted_impressions: i64,
    /// Model prediction rescaled to 0-100 across the candidate set.
    pub adscore: f64,
    /// Rule-based audience affinity.
    pub audience_match: f64,
    /// Weighted blend of `adscore` and `audience_match`.
    pub final_score: f64,
    pub distance_km: f64,
}
