//! Prometheus metrics for the enrichment pipeline.
//!
//! Recording functions are grouped by phase. Values accumulate in the
//! installed recorder and are pushed to a Pushgateway once per run when
//! `CAMPUS_EVENTS_PUSHGATEWAY_URL` is set.

use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::constants::ENV_PUSHGATEWAY_URL;

/// All metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    FeedFetch,
    FeedEvents,
    EventsSkipped,
    EventsEnriched,
    GeocodeRequests,
    GeocodeDuration,
    TagsAssigned,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FeedFetch => "campus_events_feed_fetch_total",
            MetricName::FeedEvents => "campus_events_feed_events_total",
            MetricName::EventsSkipped => "campus_events_events_skipped_total",
            MetricName::EventsEnriched => "campus_events_events_enriched_total",
            MetricName::GeocodeRequests => "campus_events_geocode_requests_total",
            MetricName::GeocodeDuration => "campus_events_geocode_duration_seconds",
            MetricName::TagsAssigned => "campus_events_tags_assigned_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            FeedFetch,
            FeedEvents,
            EventsSkipped,
            EventsEnriched,
            GeocodeRequests,
            GeocodeDuration,
            TagsAssigned,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct MetricsState {
    handle: metrics_exporter_prometheus::PrometheusHandle,
    pushgateway_url: Option<String>,
    job: String,
    instance: String,
}

static METRICS_STATE: OnceLock<MetricsState> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once; later calls
/// are no-ops.
pub fn init(instance: &str) -> anyhow::Result<()> {
    if METRICS_STATE.get().is_some() {
        return Ok(());
    }

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    let pushgateway_url = std::env::var(ENV_PUSHGATEWAY_URL)
        .ok()
        .filter(|url| !url.trim().is_empty());

    if pushgateway_url.is_some() {
        info!("Metrics system initialized with push gateway support");
    } else {
        info!("Metrics system initialized (no push gateway)");
    }

    let _ = METRICS_STATE.set(MetricsState {
        handle,
        pushgateway_url,
        job: "campus_events".to_string(),
        instance: instance.to_string(),
    });
    Ok(())
}

/// Push everything recorded so far to the Pushgateway. Failures are logged
/// and never abort the run.
pub async fn push_to_gateway() {
    let Some(state) = METRICS_STATE.get() else {
        return;
    };
    let Some(base) = state.pushgateway_url.as_deref() else {
        return;
    };

    let push_url = format!(
        "{}/metrics/job/{}/instance/{}",
        base.trim_end_matches('/'),
        state.job,
        state.instance
    );
    let body = state.handle.render();

    let result = reqwest::Client::new()
        .post(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            info!("Pushed metrics to Pushgateway for instance={}", state.instance)
        }
        Ok(resp) => warn!("Pushgateway returned status {}", resp.status()),
        Err(e) => warn!("Failed to push metrics: {}", e),
    }
}

// ============================================================================
// Feed Metrics
// ============================================================================

pub mod feed {
    use super::MetricName;

    /// Record a feed fetch by outcome (`ok`, `error`, `parse_error`)
    pub fn fetch(outcome: &'static str) {
        ::metrics::counter!(MetricName::FeedFetch.as_str(), "outcome" => outcome).increment(1);
    }

    /// Record the number of VEVENTs read from a feed
    pub fn events(count: usize) {
        ::metrics::counter!(MetricName::FeedEvents.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Event Metrics
// ============================================================================

pub mod events {
    use super::MetricName;

    /// Record an event dropped before enrichment (`duplicate`, `past`)
    pub fn skipped(reason: &'static str) {
        ::metrics::counter!(MetricName::EventsSkipped.as_str(), "reason" => reason).increment(1);
    }

    /// Record an emitted record by validity label
    pub fn enriched(validity: &'static str) {
        ::metrics::counter!(MetricName::EventsEnriched.as_str(), "validity" => validity)
            .increment(1);
    }
}

// ============================================================================
// Geocode Metrics
// ============================================================================

pub mod geocode {
    use super::MetricName;

    /// Record a geocoder call by outcome (`ok`, `no_match`, or an error kind)
    pub fn request(outcome: &'static str) {
        ::metrics::counter!(MetricName::GeocodeRequests.as_str(), "outcome" => outcome)
            .increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::GeocodeDuration.as_str()).record(secs);
    }
}

// ============================================================================
// Tag Metrics
// ============================================================================

pub mod tags {
    use super::MetricName;

    pub fn assigned(tag: &str) {
        ::metrics::counter!(MetricName::TagsAssigned.as_str(), "tag" => tag.to_string())
            .increment(1);
    }
}
