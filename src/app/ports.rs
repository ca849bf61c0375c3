use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GeocodeError;
use crate::pipeline::processing::address::GeoPoint;
use crate::pipeline::processing::enrich::EnrichedEvent;

/// One candidate match returned by a geocoding provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub formatted_address: String,
    pub lat: f64,
    pub lon: f64,
}

impl GeocodeCandidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Successful geocoder answer: nothing found, or candidates in provider order
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    NoMatch,
    Candidates(Vec<GeocodeCandidate>),
}

#[async_trait]
pub trait GeocoderPort: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeOutcome, GeocodeError>;
}

#[async_trait]
pub trait RateLimiterPort: Send + Sync {
    async fn acquire(&self);
}

#[async_trait]
pub trait EnrichOutputPort: Send + Sync {
    async fn write_enriched_event(&self, event: &EnrichedEvent) -> anyhow::Result<()>;
}
