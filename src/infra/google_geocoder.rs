use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::app::ports::{GeocodeCandidate, GeocodeOutcome, GeocoderPort, RateLimiterPort};
use crate::constants::GOOGLE_GEOCODE_URL;
use crate::error::GeocodeError;

#[derive(Debug, Deserialize)]
pub struct GeocodeApiResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeApiResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeApiResult {
    pub formatted_address: String,
    pub geometry: GeocodeApiGeometry,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeApiGeometry {
    pub location: GeocodeApiLatLng,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeApiLatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Map a Geocoding API response body onto the port's outcome.
pub fn interpret_response(response: GeocodeApiResponse) -> Result<GeocodeOutcome, GeocodeError> {
    match response.status.as_str() {
        "OK" => Ok(GeocodeOutcome::Candidates(
            response
                .results
                .into_iter()
                .map(|r| GeocodeCandidate {
                    formatted_address: r.formatted_address,
                    lat: r.geometry.location.lat,
                    lon: r.geometry.location.lng,
                })
                .collect(),
        )),
        "ZERO_RESULTS" => Ok(GeocodeOutcome::NoMatch),
        other => Err(GeocodeError::Provider {
            status: other.to_string(),
            message: response.error_message.unwrap_or_default(),
        }),
    }
}

/// Google Maps Geocoding API client
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    limiter: Box<dyn RateLimiterPort>,
}

impl GoogleGeocoder {
    pub fn new(
        api_key: Option<String>,
        timeout: Duration,
        limiter: Box<dyn RateLimiterPort>,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: GOOGLE_GEOCODE_URL.to_string(),
            limiter,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl GeocoderPort for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError> {
        let key = self.api_key.as_deref().ok_or(GeocodeError::MissingKey)?;

        self.limiter.acquire().await;

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", key)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Provider {
                status: format!("HTTP {}", status.as_u16()),
                message: String::new(),
            });
        }

        let body = resp.text().await?;
        let parsed: GeocodeApiResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Malformed(e.to_string()))?;
        debug!(status = %parsed.status, results = parsed.results.len(), "Geocode API response");

        interpret_response(parsed)
    }
}
