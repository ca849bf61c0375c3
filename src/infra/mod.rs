// Adapters implementing the application ports

pub mod enrich_output_adapter;
pub mod google_geocoder;
pub mod output_file;
pub mod rate_limiter_adapter;
pub mod report_output_adapter;

pub use enrich_output_adapter::NdjsonOutputAdapter;
pub use google_geocoder::GoogleGeocoder;
pub use rate_limiter_adapter::RateLimiterAdapter;
pub use report_output_adapter::TextReportOutputAdapter;
