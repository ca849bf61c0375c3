// Observability: metrics and logging

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init, push_to_gateway};
