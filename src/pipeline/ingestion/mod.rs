// Pipeline ingestion: feed reading and rate limiting

pub mod ical_feed;
pub mod rate_limiter;
