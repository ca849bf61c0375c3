// Pipeline processing: location cleanup, address validation, tagging, enrichment

pub mod location;
pub mod address;
pub mod tags;
pub mod enrich;
