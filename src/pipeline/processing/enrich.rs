use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::GOOGLE_MAPS_SEARCH_URL;
use crate::pipeline::processing::address::{AddressValidation, AddressValidator, ValidityLabel};
use crate::pipeline::processing::location::{LocationNormalizer, NormalizedLocation};
use crate::pipeline::processing::tags::TagClassifier;
use crate::types::{EventTime, RawEvent};

/// A calendar event enriched with a cleaned location, address validation
/// and topical tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub uid: String,
    pub title: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub description: String,
    pub url: Option<String>,
    pub source: String,
    pub original_location: String,
    pub location: NormalizedLocation,
    pub cleaned_location: String,
    pub validation: AddressValidation,
    pub google_maps_url: String,
    pub tags: Vec<String>,
    /// When this enrichment was performed
    pub enriched_at: DateTime<Utc>,
}

impl EnrichedEvent {
    pub fn is_remote(&self) -> bool {
        self.validation.validity_label == ValidityLabel::ValidAndRemote
    }
}

/// Search link for manually checking a location on Google Maps
pub fn google_maps_url(cleaned_location: &str) -> String {
    format!(
        "{}{}",
        GOOGLE_MAPS_SEARCH_URL,
        urlencoding::encode(cleaned_location)
    )
}

/// Runs normalization, validation and tagging for one event
pub struct EventEnricher {
    normalizer: LocationNormalizer,
    validator: AddressValidator,
    classifier: TagClassifier,
}

impl EventEnricher {
    pub fn new(
        normalizer: LocationNormalizer,
        validator: AddressValidator,
        classifier: TagClassifier,
    ) -> Self {
        Self {
            normalizer,
            validator,
            classifier,
        }
    }

    /// Enrich a single raw event. Remote locations are never geocoded.
    pub async fn enrich(&self, event: &RawEvent) -> EnrichedEvent {
        let location = self.normalizer.normalize(&event.location);
        let cleaned_location = location.cleaned();
        let tags = self.classifier.classify(&event.title, &event.description);

        let validation = if location.is_remote() {
            debug!(uid = %event.uid, "Remote event, skipping geocoder");
            AddressValidation::remote()
        } else {
            self.validator.validate(&cleaned_location).await
        };

        EnrichedEvent {
            uid: event.uid.clone(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            description: event.description.clone(),
            url: event.url.clone(),
            source: event.source.clone(),
            original_location: event.location.clone(),
            google_maps_url: google_maps_url(&cleaned_location),
            location,
            cleaned_location,
            validation,
            tags,
            enriched_at: Utc::now(),
        }
    }
}
