//! iCalendar feed reader: fetches a feed over HTTP(S) or from disk and turns
//! its VEVENTs into [`RawEvent`]s.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use std::io::BufReader;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{EnricherError, Result};
use crate::observability::metrics;
use crate::types::{EventTime, FeedReader, FeedSource, RawEvent};

pub struct IcalFeedReader {
    client: reqwest::Client,
}

impl Default for IcalFeedReader {
    fn default() -> Self {
        Self::new()
    }
}

impl IcalFeedReader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn load(&self, source: &FeedSource) -> Result<Vec<u8>> {
        let fetch_error = |message: String| EnricherError::FeedFetch {
            feed: source.to_string(),
            message,
        };

        if source.is_remote() {
            let resp = self
                .client
                .get(source.as_str())
                .send()
                .await
                .map_err(|e| fetch_error(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(fetch_error(format!("HTTP status {}", status.as_u16())));
            }
            let bytes = resp.bytes().await.map_err(|e| fetch_error(e.to_string()))?;
            Ok(bytes.to_vec())
        } else {
            tokio::fs::read(source.as_str())
                .await
                .map_err(|e| fetch_error(e.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl FeedReader for IcalFeedReader {
    fn reader_name(&self) -> &'static str {
        "ical"
    }

    #[instrument(skip(self, source), fields(source = %source))]
    async fn fetch_events(&self, source: &FeedSource) -> Result<Vec<RawEvent>> {
        let bytes = match self.load(source).await {
            Ok(bytes) => bytes,
            Err(e) => {
                metrics::feed::fetch("error");
                return Err(e);
            }
        };
        debug!("Fetched {} bytes", bytes.len());

        let events = match parse_ics(source.as_str(), &bytes) {
            Ok(events) => events,
            Err(e) => {
                metrics::feed::fetch("parse_error");
                return Err(e);
            }
        };

        metrics::feed::fetch("ok");
        metrics::feed::events(events.len());
        info!("Parsed {} events", events.len());
        Ok(events)
    }
}

/// Parse an iCalendar document. Only VEVENTs are read; events without a UID
/// or a usable DTSTART are skipped.
pub fn parse_ics(source: &str, bytes: &[u8]) -> Result<Vec<RawEvent>> {
    let parser = ical::IcalParser::new(BufReader::new(bytes));
    let mut events = Vec::new();

    for calendar in parser {
        let calendar = calendar.map_err(|e| EnricherError::FeedParse {
            feed: source.to_string(),
            message: e.to_string(),
        })?;

        for event in &calendar.events {
            match raw_event_from(source, event) {
                Some(raw) => events.push(raw),
                None => warn!(source = %source, "Skipping VEVENT without UID or DTSTART"),
            }
        }
    }

    Ok(events)
}

fn raw_event_from(source: &str, event: &IcalEvent) -> Option<RawEvent> {
    let mut uid = None;
    let mut title = String::new();
    let mut start = None;
    let mut end = None;
    let mut description = String::new();
    let mut url = None;
    let mut location = String::new();

    for property in &event.properties {
        match property.name.to_ascii_uppercase().as_str() {
            "UID" => uid = text_value(property).filter(|v| !v.is_empty()),
            "SUMMARY" => title = text_value(property).unwrap_or_default(),
            "DTSTART" => start = parse_event_time(property),
            "DTEND" => end = parse_event_time(property),
            "DESCRIPTION" => description = text_value(property).unwrap_or_default(),
            "URL" => url = property.value.clone().filter(|v| !v.trim().is_empty()),
            "LOCATION" => location = text_value(property).unwrap_or_default(),
            _ => {}
        }
    }

    Some(RawEvent {
        uid: uid?,
        title,
        start: start?,
        end,
        description,
        url,
        location,
        source: source.to_string(),
    })
}

fn text_value(property: &Property) -> Option<String> {
    property.value.as_deref().map(unescape_text)
}

/// Undo RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn param_values<'a>(property: &'a Property, name: &str) -> Option<&'a [String]> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values.as_slice())
}

fn parse_event_time(property: &Property) -> Option<EventTime> {
    let value = property.value.as_deref()?.trim();
    let is_date = param_values(property, "VALUE")
        .map(|values| values.iter().any(|v| v.eq_ignore_ascii_case("DATE")))
        .unwrap_or(false);

    if is_date || (value.len() == 8 && value.chars().all(|c| c.is_ascii_digit())) {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(EventTime::AllDay);
    }

    if let Some(utc) = value.strip_suffix('Z').or_else(|| value.strip_suffix('z')) {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(EventTime::At(Utc.from_utc_datetime(&naive)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    if let Some(tz) = named_zone(property) {
        let zoned = tz.from_local_datetime(&naive).earliest()?;
        return Some(EventTime::At(zoned.with_timezone(&Utc)));
    }

    // Floating times and unknown TZIDs fall back to the local zone
    let local: DateTime<Local> = Local.from_local_datetime(&naive).earliest()?;
    Some(EventTime::At(local.with_timezone(&Utc)))
}

fn named_zone(property: &Property) -> Option<Tz> {
    let tzid = param_values(property, "TZID")?.first()?;
    let tzid = tzid.trim().trim_matches('"');
    match tzid.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            warn!(tzid = %tzid, "Unknown TZID, reading time in the local zone");
            None
        }
    }
}
