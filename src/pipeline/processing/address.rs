//! Address validation against a geocoding provider.
//!
//! The geocoder may return several candidates for one location string. The
//! candidate closest to the reference point is kept, and the distance together
//! with the number of candidates decides the validity label.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::app::ports::{GeocodeCandidate, GeocodeOutcome, GeocoderPort};
use crate::constants::{DEFAULT_PROXIMITY_THRESHOLD_MILES, REFERENCE_LAT, REFERENCE_LON};
use crate::observability::metrics;

const EARTH_RADIUS_METERS: f64 = 6_378_137.0;
const METERS_PER_MILE: f64 = 1_609.344;

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle (haversine) distance in miles
    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lon - self.lon).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_METERS * c / METERS_PER_MILE
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(REFERENCE_LAT, REFERENCE_LON)
    }
}

/// Confidence tier assigned to an event location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidityLabel {
    /// Exactly one candidate, close to campus
    #[serde(rename = "yes")]
    Yes,
    /// Several candidates; the nearest one is close to campus
    #[serde(rename = "maybe")]
    Maybe,
    /// The geocoder found something, but far from campus
    #[serde(rename = "maybe not")]
    MaybeNot,
    /// No match, or the geocoder failed
    #[serde(rename = "no")]
    No,
    /// Remote event; never geocoded
    #[serde(rename = "valid and remote")]
    ValidAndRemote,
}

impl ValidityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityLabel::Yes => "yes",
            ValidityLabel::Maybe => "maybe",
            ValidityLabel::MaybeNot => "maybe not",
            ValidityLabel::No => "no",
            ValidityLabel::ValidAndRemote => "valid and remote",
        }
    }
}

impl fmt::Display for ValidityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressValidation {
    pub is_valid: bool,
    pub validity_label: ValidityLabel,
    /// Empty unless `is_valid`
    pub formatted_address: String,
}

impl AddressValidation {
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            validity_label: ValidityLabel::No,
            formatted_address: String::new(),
        }
    }

    /// Remote events carry no geocoded address, so they are not `is_valid`.
    pub fn remote() -> Self {
        Self {
            is_valid: false,
            validity_label: ValidityLabel::ValidAndRemote,
            formatted_address: String::new(),
        }
    }
}

/// Pick the nearest candidate and label it.
///
/// Ties keep the first candidate in provider order. A distance equal to the
/// threshold counts as near.
pub fn classify_nearest(
    candidates: &[(GeocodeCandidate, f64)],
    threshold_miles: f64,
) -> AddressValidation {
    let mut nearest: Option<&(GeocodeCandidate, f64)> = None;
    for entry in candidates {
        match nearest {
            Some((_, best)) if entry.1 >= *best => {}
            _ => nearest = Some(entry),
        }
    }

    let Some((candidate, distance)) = nearest else {
        return AddressValidation::invalid();
    };

    let validity_label = if *distance <= threshold_miles {
        if candidates.len() == 1 {
            ValidityLabel::Yes
        } else {
            ValidityLabel::Maybe
        }
    } else {
        ValidityLabel::MaybeNot
    };

    AddressValidation {
        is_valid: true,
        validity_label,
        formatted_address: candidate.formatted_address.clone(),
    }
}

/// Geocodes cleaned locations and judges them against a reference point
pub struct AddressValidator {
    geocoder: Arc<dyn GeocoderPort>,
    reference_point: GeoPoint,
    threshold_miles: f64,
}

impl AddressValidator {
    pub fn new(geocoder: Arc<dyn GeocoderPort>) -> Self {
        Self {
            geocoder,
            reference_point: GeoPoint::default(),
            threshold_miles: DEFAULT_PROXIMITY_THRESHOLD_MILES,
        }
    }

    pub fn with_reference(mut self, reference_point: GeoPoint, threshold_miles: f64) -> Self {
        self.reference_point = reference_point;
        self.threshold_miles = threshold_miles;
        self
    }

    pub fn reference_point(&self) -> GeoPoint {
        self.reference_point
    }

    pub fn threshold_miles(&self) -> f64 {
        self.threshold_miles
    }

    /// Validate a cleaned, non-remote location. Provider failures become `no`.
    pub async fn validate(&self, cleaned_location: &str) -> AddressValidation {
        if cleaned_location.trim().is_empty() {
            debug!("Empty location, skipping geocoder");
            return AddressValidation::invalid();
        }

        let started = Instant::now();
        let result = self.geocoder.geocode(cleaned_location).await;
        metrics::geocode::duration(started.elapsed().as_secs_f64());

        match result {
            Ok(GeocodeOutcome::Candidates(candidates)) if !candidates.is_empty() => {
                metrics::geocode::request("ok");
                debug!(
                    location = %cleaned_location,
                    candidates = candidates.len(),
                    "Geocoder returned candidates"
                );
                self.assess(candidates)
            }
            Ok(_) => {
                metrics::geocode::request("no_match");
                debug!(location = %cleaned_location, "Geocoder found no match");
                AddressValidation::invalid()
            }
            Err(e) => {
                metrics::geocode::request(e.kind());
                warn!(location = %cleaned_location, error = %e, "Geocoding failed");
                AddressValidation::invalid()
            }
        }
    }

    /// Measure every candidate against the reference point and classify.
    pub fn assess(&self, candidates: Vec<GeocodeCandidate>) -> AddressValidation {
        let measured: Vec<(GeocodeCandidate, f64)> = candidates
            .into_iter()
            .map(|c| {
                let miles = self.reference_point.distance_miles(&c.point());
                (c, miles)
            })
            .collect();
        classify_nearest(&measured, self.threshold_miles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Point `miles` due north of `origin`
    fn north_of(origin: GeoPoint, miles: f64) -> GeoPoint {
        let delta = (miles * METERS_PER_MILE / EARTH_RADIUS_METERS).to_degrees();
        GeoPoint::new(origin.lat + delta, origin.lon)
    }

    fn candidate(address: &str, at: GeoPoint) -> GeocodeCandidate {
        GeocodeCandidate {
            formatted_address: address.to_string(),
            lat: at.lat,
            lon: at.lon,
        }
    }

    struct FixedGeocoder {
        response: fn() -> Result<GeocodeOutcome, GeocodeError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeocoderPort for FixedGeocoder {
        async fn geocode(&self, _address: &str) -> Result<GeocodeOutcome, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    fn validator(response: fn() -> Result<GeocodeOutcome, GeocodeError>) -> (AddressValidator, Arc<FixedGeocoder>) {
        let geocoder = Arc::new(FixedGeocoder {
            response,
            calls: AtomicUsize::new(0),
        });
        (AddressValidator::new(geocoder.clone()), geocoder)
    }

    #[test]
    fn test_distance_along_meridian() {
        let origin = GeoPoint::default();
        let two = north_of(origin, 2.0);
        assert!((origin.distance_miles(&two) - 2.0).abs() < 1e-6);
        assert!(origin.distance_miles(&origin).abs() < 1e-12);
    }

    #[test]
    fn test_distance_denver_to_boulder() {
        let campus = GeoPoint::default();
        let boulder = GeoPoint::new(40.01499, -105.27055);
        let miles = campus.distance_miles(&boulder);
        assert!(miles > 23.0 && miles < 25.0, "got {miles}");
    }

    #[test]
    fn test_single_candidate_at_threshold_is_yes() {
        let c = candidate("A", GeoPoint::default());
        let result = classify_nearest(&[(c, 5.0)], 5.0);
        assert!(result.is_valid);
        assert_eq!(result.validity_label, ValidityLabel::Yes);
        assert_eq!(result.formatted_address, "A");
    }

    #[test]
    fn test_single_candidate_past_threshold_is_maybe_not() {
        let c = candidate("A", GeoPoint::default());
        let result = classify_nearest(&[(c, 5.01)], 5.0);
        assert!(result.is_valid);
        assert_eq!(result.validity_label, ValidityLabel::MaybeNot);
        assert_eq!(result.formatted_address, "A");
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let origin = GeoPoint::default();
        let result = classify_nearest(
            &[
                (candidate("first", origin), 1.0),
                (candidate("second", origin), 1.0),
            ],
            5.0,
        );
        assert_eq!(result.validity_label, ValidityLabel::Maybe);
        assert_eq!(result.formatted_address, "first");
    }

    #[test]
    fn test_no_candidates_is_invalid() {
        assert_eq!(classify_nearest(&[], 5.0), AddressValidation::invalid());
    }

    #[test]
    fn test_nearest_of_two_is_maybe() {
        let (validator, _) = validator(|| Ok(GeocodeOutcome::NoMatch));
        let origin = validator.reference_point();
        let result = validator.assess(vec![
            candidate("eight miles", north_of(origin, 8.0)),
            candidate("two miles", north_of(origin, 2.0)),
        ]);
        assert!(result.is_valid);
        assert_eq!(result.validity_label, ValidityLabel::Maybe);
        assert_eq!(result.formatted_address, "two miles");
    }

    #[test]
    fn test_all_far_candidates_is_maybe_not() {
        let (validator, _) = validator(|| Ok(GeocodeOutcome::NoMatch));
        let origin = validator.reference_point();
        let result = validator.assess(vec![
            candidate("twelve", north_of(origin, 12.0)),
            candidate("eight", north_of(origin, 8.0)),
        ]);
        assert_eq!(result.validity_label, ValidityLabel::MaybeNot);
        assert_eq!(result.formatted_address, "eight");
    }

    #[tokio::test]
    async fn test_provider_error_becomes_no() {
        let (validator, geocoder) = validator(|| Err(GeocodeError::Timeout));
        let result = validator.validate("1250 14th St, Denver").await;
        assert_eq!(result, AddressValidation::invalid());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_match_becomes_no() {
        let (validator, _) = validator(|| Ok(GeocodeOutcome::NoMatch));
        let result = validator.validate("Nowhere in particular").await;
        assert!(!result.is_valid);
        assert_eq!(result.validity_label, ValidityLabel::No);
        assert!(result.formatted_address.is_empty());
    }

    #[tokio::test]
    async fn test_single_nearby_match_is_yes() {
        let (validator, _) = validator(|| {
            Ok(GeocodeOutcome::Candidates(vec![GeocodeCandidate {
                formatted_address: "900 Auraria Pkwy, Denver, CO 80204, USA".to_string(),
                lat: 39.7446,
                lon: -105.0058,
            }]))
        });
        let result = validator.validate("900 Auraria Pkwy, Denver, CO 80204").await;
        assert_eq!(result.validity_label, ValidityLabel::Yes);
        assert_eq!(result.formatted_address, "900 Auraria Pkwy, Denver, CO 80204, USA");
    }

    #[tokio::test]
    async fn test_empty_location_skips_geocoder() {
        let (validator, geocoder) = validator(|| Ok(GeocodeOutcome::NoMatch));
        let result = validator.validate("  ").await;
        assert_eq!(result.validity_label, ValidityLabel::No);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(ValidityLabel::MaybeNot.to_string(), "maybe not");
        assert_eq!(ValidityLabel::ValidAndRemote.as_str(), "valid and remote");
        assert_eq!(
            serde_json::to_string(&ValidityLabel::MaybeNot).unwrap(),
            "\"maybe not\""
        );
    }
}
