#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Great-circle distance and radius filtering for candidate locations.
//!
//! The candidate dataset is small, so filtering is a brute-force pass over
//! every location. There is no spatial index.

use adspecta_location_models::{Candidate, LocationRecord};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Maximum distance from the requester for a location to be considered.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Haversine great-circle distance in kilometers between two points given
/// in degrees.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    // Rounding can push `a` a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Radius and type filter applied to the raw dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFilter {
    lat: f64,
    lng: f64,
    radius_km: f64,
    category: Option<String>,
}

impl GeoFilter {
    /// Creates a filter centred on the requester with the default radius.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            radius_km: DEFAULT_RADIUS_KM,
            category: None,
        }
    }

    /// Restricts matches to a location type (case-insensitive exact match).
    #[must_use]
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_owned);
        self
    }

    /// Returns the distance from the filter centre to a location.
    #[must_use]
    pub fn distance_to(&self, record: &LocationRecord) -> f64 {
        haversine_km(self.lat, self.lng, record.lat, record.lng)
    }

    /// Returns `true` if the location has the requested type, or no type was
    /// requested.
    #[must_use]
    pub fn matches_category(&self, record: &LocationRecord) -> bool {
        self.category
            .as_deref()
            .is_none_or(|wanted| record.category.to_lowercase() == wanted.to_lowercase())
    }

    /// Keeps the locations within the radius that match the type filter,
    /// preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a LocationRecord>) -> Vec<Candidate> {
        let mut total = 0_usize;
        let mut in_radius = 0_usize;

        let candidates: Vec<Candidate> = records
            .into_iter()
            .inspect(|_| total += 1)
            .filter_map(|record| {
                let distance_km = self.distance_to(record);
                (distance_km <= self.radius_km).then(|| Candidate {
                    record: record.clone(),
                    distance_km,
                })
            })
            .inspect(|_| in_radius += 1)
            .filter(|c| self.matches_category(&c.record))
            .collect();

        log::debug!(
            "Geo filter: {total} locations, {in_radius} within {} km, {} after type filter",
            self.radius_km,
            candidates.len()
        );

        candidates
    }
}
