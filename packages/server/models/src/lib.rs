#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the AdSpecta server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the pipeline types so the wire contract can evolve independently.

use adspecta_location_models::{
    AdQuery, AudienceSegment, DEFAULT_AUDIENCE_AGE_MAX, DEFAULT_AUDIENCE_AGE_MIN, RankedLocation,
};
use serde::{Deserialize, Serialize};

const fn default_age_min() -> i32 {
    DEFAULT_AUDIENCE_AGE_MIN
}

const fn default_age_max() -> i32 {
    DEFAULT_AUDIENCE_AGE_MAX
}

fn default_audience_type() -> String {
    AudienceSegment::General.to_string()
}

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Requester latitude in degrees.
    pub lat: f64,
    /// Requester longitude in degrees.
    pub lng: f64,
    /// Maximum monthly price.
    pub budget: f64,
    #[serde(default = "default_age_min")]
    pub audience_age_min: i32,
    #[serde(default = "default_age_max")]
    pub audience_age_max: i32,
    /// Audience segment tag. Unknown tags score like `general`.
    #[serde(default = "default_audience_type")]
    pub audience_type: String,
    /// Restrict results to this location type.
    #[serde(default)]
    pub preferred_type: Option<String>,
}

impl PredictRequest {
    /// Checks the request for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("lat must be between -90 and 90, got {}", self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!("lng must be between -180 and 180, got {}", self.lng));
        }
        if !self.budget.is_finite() {
            return Err("budget must be a finite number".to_string());
        }
        if self.audience_age_min > self.audience_age_max {
            return Err(format!(
                "audience_age_min ({}) must not exceed audience_age_max ({})",
                self.audience_age_min, self.audience_age_max
            ));
        }
        Ok(())
    }

    /// Converts the request into a pipeline query.
    #[must_use]
    pub fn to_query(&self) -> AdQuery {
        let query = AdQuery::new(self.lat, self.lng, self.budget)
            .with_audience(AudienceSegment::from_tag(&self.audience_type))
            .with_age_range(self.audience_age_min, self.audience_age_max);

        match self.preferred_type.as_deref() {
            Some(preferred) => query.with_preferred_type(preferred),
            None => query,
        }
    }
}

/// A recommended location as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRankedLocation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Location type tag.
    #[serde(rename = "type")]
    pub category: String,
    pub price_per_month: f64,
    /// Predicted monthly impressions.
    pub predicted_impressions: i64,
    pub audience_match: f64,
    /// Ranking score; results are sorted by this, descending.
    pub final_score: f64,
}

impl From<RankedLocation> for ApiRankedLocation {
    fn from(row: RankedLocation) -> Self {
        Self {
            id: row.id,
            name: row.name,
            lat: row.lat,
            lng: row.lng,
            category: row.category,
            price_per_month: row.price_per_month,
            predicted_impressions: row.predicted_impressions,
            audience_match: row.audience_match,
            final_score: row.final_score,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"ok"` while the server is up.
    pub status: String,
}

impl ApiHealth {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable failure reason.
    pub detail: String,
}

impl ApiError {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
