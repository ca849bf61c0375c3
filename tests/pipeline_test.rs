use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use campus_events::app::enrich_use_case::EnrichUseCase;
use campus_events::app::ports::{GeocodeCandidate, GeocodeOutcome, GeocoderPort};
use campus_events::error::GeocodeError;
use campus_events::infra::{NdjsonOutputAdapter, TextReportOutputAdapter};
use campus_events::pipeline::ingestion::ical_feed::IcalFeedReader;
use campus_events::pipeline::processing::address::{AddressValidator, ValidityLabel};
use campus_events::pipeline::processing::enrich::{EnrichedEvent, EventEnricher};
use campus_events::pipeline::processing::location::LocationNormalizer;
use campus_events::pipeline::processing::tags::TagClassifier;
use campus_events::types::FeedSource;

/// Answers by keyword so each fixture location lands in a known validity tier
struct ScriptedGeocoder {
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

fn candidate(address: &str, lat: f64, lon: f64) -> GeocodeCandidate {
    GeocodeCandidate {
        formatted_address: address.to_string(),
        lat,
        lon,
    }
}

#[async_trait]
impl GeocoderPort for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> std::result::Result<GeocodeOutcome, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(address.to_string());

        if address.contains("Nowhere") {
            return Err(GeocodeError::Transport("connection reset".to_string()));
        }
        if address.contains("Boulder") {
            return Ok(GeocodeOutcome::Candidates(vec![candidate(
                "Chautauqua Park, Boulder, CO 80302, USA",
                39.9990,
                -105.2817,
            )]));
        }
        if address.contains("Museum") {
            return Ok(GeocodeOutcome::Candidates(vec![
                candidate("Denver Art Museum, Denver, CO 80204, USA", 39.7372, -104.9893),
                candidate("Museum Rd, Pueblo, CO, USA", 38.2544, -104.6091),
            ]));
        }
        Ok(GeocodeOutcome::Candidates(vec![candidate(
            "1201 5th St, Denver, CO 80204, USA",
            39.7446,
            -105.0058,
        )]))
    }
}

fn fixture(name: &str) -> FeedSource {
    FeedSource::new(format!(
        "{}/tests/fixtures/{}",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
}

fn build_enricher(geocoder: Arc<ScriptedGeocoder>) -> EventEnricher {
    EventEnricher::new(
        LocationNormalizer::default(),
        AddressValidator::new(geocoder),
        TagClassifier::default(),
    )
}

fn cutoff() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 7, 0, 0).unwrap()
}

#[tokio::test]
async fn test_fixture_feed_end_to_end() -> Result<()> {
    let temp_dir = tempdir()?;
    let output_path = temp_dir.path().join("out").join("enriched.ndjson");
    let output_path = output_path.to_str().unwrap().to_string();

    let geocoder = Arc::new(ScriptedGeocoder::new());
    let sink = NdjsonOutputAdapter::new(&output_path)?;
    let use_case =
        EnrichUseCase::new(build_enricher(geocoder.clone()), Box::new(sink)).with_cutoff(cutoff());

    let summary = use_case
        .run_feeds(&IcalFeedReader::new(), &[fixture("campus_events.ics")])
        .await?;

    assert!(!summary.has_failures());
    let stats = &summary.feeds[0];
    assert_eq!(stats.fetched, 7);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.past, 1);
    assert_eq!(stats.enriched, 5);

    let written = std::fs::read_to_string(&output_path)?;
    let events: Vec<EnrichedEvent> = written
        .lines()
        .map(serde_json::from_str)
        .collect::<std::result::Result<_, _>>()?;

    let uids: Vec<&str> = events.iter().map(|e| e.uid.as_str()).collect();
    assert_eq!(
        uids,
        vec![
            "fx-1@campus.example.edu",
            "fx-2@campus.example.edu",
            "fx-4@campus.example.edu",
            "fx-5@campus.example.edu",
            "fx-6@campus.example.edu",
        ]
    );

    let labels: Vec<ValidityLabel> = events.iter().map(|e| e.validation.validity_label).collect();
    assert_eq!(
        labels,
        vec![
            ValidityLabel::Yes,
            ValidityLabel::ValidAndRemote,
            ValidityLabel::Maybe,
            ValidityLabel::No,
            ValidityLabel::MaybeNot,
        ]
    );

    // First occurrence of a duplicated UID wins
    assert_eq!(events[0].title, "Zumba in the gym");
    assert_eq!(events[0].cleaned_location, "1201 5th St, Denver, CO 80204, Room 205");
    assert_eq!(events[0].tags, vec!["fitness"]);

    assert_eq!(events[1].cleaned_location, "Microsoft Teams");
    assert!(!events[1].validation.is_valid);
    assert!(events[1].validation.formatted_address.is_empty());
    assert_eq!(events[1].tags, vec!["career"]);

    assert_eq!(events[2].cleaned_location, "Denver Art Museum, 100 W 14th Ave");
    assert_eq!(
        events[2].validation.formatted_address,
        "Denver Art Museum, Denver, CO 80204, USA"
    );
    assert_eq!(events[2].tags, vec!["arts and culture"]);

    assert!(!events[3].validation.is_valid);
    assert_eq!(events[3].tags, vec!["uncategorized"]);

    assert!(events[4].validation.is_valid);
    assert_eq!(events[4].cleaned_location, "Chautauqua Park, Boulder");

    // Remote events never reach the geocoder
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 4);
    let queries = geocoder.queries.lock().unwrap();
    assert!(queries.iter().all(|q| !q.contains("Teams")));

    Ok(())
}

#[tokio::test]
async fn test_uids_are_shared_across_feeds_and_failures_are_isolated() -> Result<()> {
    let temp_dir = tempdir()?;
    let output_path = temp_dir.path().join("results.txt");
    let output_path = output_path.to_str().unwrap().to_string();

    let geocoder = Arc::new(ScriptedGeocoder::new());
    let sink = TextReportOutputAdapter::new(&output_path)?;
    let use_case =
        EnrichUseCase::new(build_enricher(geocoder), Box::new(sink)).with_cutoff(cutoff());

    let sources = vec![
        fixture("campus_events.ics"),
        fixture("does_not_exist.ics"),
        fixture("late_feed.ics"),
    ];
    let summary = use_case.run_feeds(&IcalFeedReader::new(), &sources).await?;

    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].source.ends_with("does_not_exist.ics"));
    assert_eq!(summary.feeds.len(), 2);
    assert_eq!(summary.feeds[1].duplicates, 1);
    assert_eq!(summary.feeds[1].enriched, 1);
    assert_eq!(summary.total_enriched(), 6);

    let report = std::fs::read_to_string(&output_path)?;
    assert_eq!(report.matches("---\n").count(), 6);
    assert!(report.contains("Cleaned Location: Online\nValid Location: valid and remote\n---\n"));
    assert!(report.contains("Valid Location: maybe not\nGeocoded Address: Chautauqua Park"));
    assert!(report.contains(
        "Google Maps URL: https://www.google.com/maps/search/?api=1&query=1201%205th%20St%2C%20Denver%2C%20CO%2080204%2C%20Room%20205"
    ));
    assert!(!report.contains("Career fair (mirror)"));

    Ok(())
}

#[tokio::test]
async fn test_everything_in_the_past_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let output_path = temp_dir.path().join("results.txt");
    let output_path = output_path.to_str().unwrap().to_string();

    let geocoder = Arc::new(ScriptedGeocoder::new());
    let sink = TextReportOutputAdapter::new(&output_path)?;
    let far_future = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
    let use_case =
        EnrichUseCase::new(build_enricher(geocoder.clone()), Box::new(sink)).with_cutoff(far_future);

    let summary = use_case
        .run_feeds(&IcalFeedReader::new(), &[fixture("campus_events.ics")])
        .await?;

    assert_eq!(summary.total_enriched(), 0);
    assert_eq!(summary.feeds[0].past, 6);
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    assert!(std::fs::read_to_string(&output_path)?.is_empty());

    Ok(())
}
