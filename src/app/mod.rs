pub mod ports;
pub mod enrich_use_case;
