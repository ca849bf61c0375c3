use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{
    DEFAULT_FEED_URL, DEFAULT_GEOCODE_REQUESTS_PER_MIN, DEFAULT_GEOCODE_TIMEOUT_SECS,
    DEFAULT_OUTPUT_PATH, DEFAULT_PROXIMITY_THRESHOLD_MILES, ENV_FEEDS, ENV_PROVIDER_KEY,
    ENV_PROVIDER_KEY_LEGACY, REFERENCE_LAT, REFERENCE_LON,
};
use crate::error::{EnricherError, Result};
use crate::pipeline::processing::address::GeoPoint;
use crate::pipeline::processing::location::{BuildingCode, LocationRules};
use crate::pipeline::processing::tags::{TagCategory, TagTaxonomy};
use crate::types::FeedSource;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider_key: Option<String>,
    pub feed_urls: Vec<String>,
    pub proximity_threshold_miles: f64,
    pub empty_location_is_remote: bool,
    pub remote_keywords: Vec<String>,
    pub reference_point: ReferencePointConfig,
    pub geocoder: GeocoderConfig,
    pub output: OutputConfig,
    pub building_codes: Vec<BuildingCode>,
    pub tags: Vec<TagCategory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReferencePointConfig {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub timeout_secs: u64,
    /// 0 disables rate limiting
    pub requests_per_min: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain-text report blocks separated by `---`
    Text,
    /// One JSON object per line
    Ndjson,
}

impl Default for Config {
    fn default() -> Self {
        let rules = LocationRules::default();
        Self {
            provider_key: None,
            feed_urls: vec![DEFAULT_FEED_URL.to_string()],
            proximity_threshold_miles: DEFAULT_PROXIMITY_THRESHOLD_MILES,
            empty_location_is_remote: rules.empty_is_remote,
            remote_keywords: rules.remote_keywords,
            reference_point: ReferencePointConfig::default(),
            geocoder: GeocoderConfig::default(),
            output: OutputConfig::default(),
            building_codes: rules.building_codes,
            tags: TagTaxonomy::default().categories,
        }
    }
}

impl Default for ReferencePointConfig {
    fn default() -> Self {
        Self {
            lat: REFERENCE_LAT,
            lon: REFERENCE_LON,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_GEOCODE_TIMEOUT_SECS,
            requests_per_min: DEFAULT_GEOCODE_REQUESTS_PER_MIN,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from `path`, then apply environment overrides.
    /// A missing file yields the defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                EnricherError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml_str(&content)?
        } else if required {
            return Err(EnricherError::Config(format!(
                "Config file '{}' not found",
                path.display()
            )));
        } else {
            Self::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Override the provider key and feed list from the environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_PROVIDER_KEY).or_else(|| non_empty(ENV_PROVIDER_KEY_LEGACY)) {
            self.provider_key = Some(key.trim().to_string());
        }

        if let Some(feeds) = non_empty(ENV_FEEDS) {
            self.feed_urls = feeds
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.proximity_threshold_miles.is_finite() || self.proximity_threshold_miles < 0.0 {
            return Err(EnricherError::Config(format!(
                "proximity_threshold_miles must be a non-negative number, got {}",
                self.proximity_threshold_miles
            )));
        }
        let ReferencePointConfig { lat, lon } = self.reference_point;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(EnricherError::Config(format!(
                "reference_point out of range: {}, {}",
                lat, lon
            )));
        }
        if self.geocoder.timeout_secs == 0 {
            return Err(EnricherError::Config(
                "geocoder.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn location_rules(&self) -> LocationRules {
        LocationRules {
            building_codes: self.building_codes.clone(),
            remote_keywords: self.remote_keywords.clone(),
            empty_is_remote: self.empty_location_is_remote,
        }
    }

    pub fn taxonomy(&self) -> TagTaxonomy {
        TagTaxonomy {
            categories: self.tags.clone(),
        }
    }

    pub fn reference_point(&self) -> GeoPoint {
        GeoPoint::new(self.reference_point.lat, self.reference_point.lon)
    }

    pub fn feed_sources(&self) -> Vec<FeedSource> {
        self.feed_urls.iter().map(FeedSource::new).collect()
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }

    pub fn requests_per_min(&self) -> Option<u64> {
        Some(self.geocoder.requests_per_min).filter(|rpm| *rpm > 0)
    }
}
