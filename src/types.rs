use crate::error::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Start or end of a calendar event: either an instant or an all-day date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventTime {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

impl EventTime {
    /// The instant this time begins. All-day dates start at local midnight.
    pub fn as_instant(&self) -> DateTime<Utc> {
        match self {
            EventTime::At(dt) => *dt,
            EventTime::AllDay(date) => local_midnight(*date),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::At(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            EventTime::AllDay(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

/// Local midnight at the start of `date`, as a UTC instant.
pub fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    // DST gaps can swallow midnight; fall back to treating it as UTC.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Start of the current local day.
pub fn today_local_midnight() -> DateTime<Utc> {
    local_midnight(Local::now().date_naive())
}

/// One VEVENT as read from a calendar feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub uid: String,
    pub title: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub description: String,
    pub url: Option<String>,
    pub location: String,
    /// The feed this event was read from
    pub source: String,
}

/// A configured calendar source: an http(s) URL or a local file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource(pub String);

impl FeedSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_remote(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can turn a feed source into raw calendar events.
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    /// Short name used in logs
    fn reader_name(&self) -> &'static str;

    /// Fetch and parse all VEVENTs from the given source
    async fn fetch_events(&self, source: &FeedSource) -> Result<Vec<RawEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time_display() {
        let at = EventTime::At(Utc.with_ymd_and_hms(2026, 10, 20, 17, 30, 0).unwrap());
        assert_eq!(at.to_string(), "2026-10-20 17:30:00");

        let day = EventTime::AllDay(NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(day.to_string(), "2026-10-20");
    }

    #[test]
    fn test_all_day_starts_at_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        let instant = EventTime::AllDay(date).as_instant();
        assert_eq!(instant.with_timezone(&Local).date_naive(), date);
        assert_eq!(instant, local_midnight(date));
    }

    #[test]
    fn test_feed_source_kind() {
        assert!(FeedSource::new("https://example.edu/cal.ics").is_remote());
        assert!(FeedSource::new("HTTP://example.edu/cal.ics").is_remote());
        assert!(!FeedSource::new("fixtures/cal.ics").is_remote());
    }
}
