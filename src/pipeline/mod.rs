// Enrichment pipeline: feed ingestion and per-event processing

pub mod ingestion;
pub mod processing;
