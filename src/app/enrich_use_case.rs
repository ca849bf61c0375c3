use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

use crate::app::ports::EnrichOutputPort;
use crate::error::{EnricherError, Result};
use crate::observability::metrics;
use crate::pipeline::processing::enrich::{EnrichedEvent, EventEnricher};
use crate::types::{today_local_midnight, FeedReader, FeedSource, RawEvent};

/// UIDs already handled in this run, shared across feeds
#[derive(Debug, Default, Clone)]
pub struct SeenUids(HashSet<String>);

impl SeenUids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the UID had not been seen before.
    pub fn insert(&mut self, uid: &str) -> bool {
        if self.0.contains(uid) {
            return false;
        }
        self.0.insert(uid.to_string())
    }
}

/// Per-feed counters
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub source: String,
    pub fetched: usize,
    pub duplicates: usize,
    pub past: usize,
    pub enriched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub feeds: Vec<FeedStats>,
    pub failures: Vec<FeedFailure>,
}

impl RunSummary {
    pub fn total_enriched(&self) -> usize {
        self.feeds.iter().map(|f| f.enriched).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Use case for turning raw feed events into enriched records: dedup by UID,
/// drop past events, enrich the rest and hand each one to the output sink
pub struct EnrichUseCase {
    enricher: EventEnricher,
    output: Box<dyn EnrichOutputPort>,
    cutoff: DateTime<Utc>,
}

impl EnrichUseCase {
    /// The past-event cutoff is today's local midnight, captured now.
    pub fn new(enricher: EventEnricher, output: Box<dyn EnrichOutputPort>) -> Self {
        Self {
            enricher,
            output,
            cutoff: today_local_midnight(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Process one feed's events in order. Every emitted record has already
    /// been written to the sink when this returns.
    pub async fn run(
        &self,
        raw_events: &[RawEvent],
        seen: &mut SeenUids,
    ) -> Result<Vec<EnrichedEvent>> {
        let mut stats = FeedStats::default();
        self.run_with_stats(raw_events, seen, &mut stats).await
    }

    async fn run_with_stats(
        &self,
        raw_events: &[RawEvent],
        seen: &mut SeenUids,
        stats: &mut FeedStats,
    ) -> Result<Vec<EnrichedEvent>> {
        let mut enriched = Vec::new();
        stats.fetched += raw_events.len();

        for raw in raw_events {
            // Recorded before the date check so a past copy still blocks later ones
            if !seen.insert(&raw.uid) {
                debug!(uid = %raw.uid, "Duplicate UID, skipping");
                metrics::events::skipped("duplicate");
                stats.duplicates += 1;
                continue;
            }

            if raw.start.as_instant() < self.cutoff {
                debug!(uid = %raw.uid, start = %raw.start, "Past event, skipping");
                metrics::events::skipped("past");
                stats.past += 1;
                continue;
            }

            let event = self.enricher.enrich(raw).await;

            self.output
                .write_enriched_event(&event)
                .await
                .map_err(|e| EnricherError::Output(e.to_string()))?;

            metrics::events::enriched(event.validation.validity_label.as_str());
            for tag in &event.tags {
                metrics::tags::assigned(tag);
            }
            stats.enriched += 1;
            enriched.push(event);
        }

        Ok(enriched)
    }

    /// Fetch and process every source in order with one shared UID set. A
    /// feed that cannot be fetched or parsed is recorded and skipped; sink
    /// failures abort the run.
    #[instrument(skip_all, fields(reader = reader.reader_name(), feeds = sources.len()))]
    pub async fn run_feeds(
        &self,
        reader: &dyn FeedReader,
        sources: &[FeedSource],
    ) -> Result<RunSummary> {
        let mut seen = SeenUids::new();
        let mut summary = RunSummary::default();

        for source in sources {
            let raw_events = match reader.fetch_events(source).await {
                Ok(events) => events,
                Err(e) => {
                    error!(source = %source, "Feed failed: {}", e);
                    summary.failures.push(FeedFailure {
                        source: source.to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let mut stats = FeedStats {
                source: source.to_string(),
                ..FeedStats::default()
            };
            self.run_with_stats(&raw_events, &mut seen, &mut stats).await?;

            info!(
                source = %source,
                fetched = stats.fetched,
                enriched = stats.enriched,
                duplicates = stats.duplicates,
                past = stats.past,
                "Feed processed"
            );
            summary.feeds.push(stats);
        }

        Ok(summary)
    }
}
