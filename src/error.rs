use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnricherError {
    #[error("Failed to fetch feed '{feed}': {message}")]
    FeedFetch { feed: String, message: String },

    #[error("Failed to parse feed '{feed}': {message}")]
    FeedParse { feed: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output sink error: {0}")]
    Output(String),
}

pub type Result<T> = std::result::Result<T, EnricherError>;

/// Failures of the geocoding collaborator. These never leave the address
/// validator; they are folded into a `no` validity label.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("geocoder transport failure: {0}")]
    Transport(String),

    #[error("geocoder request timed out")]
    Timeout,

    #[error("geocoder returned status {status}: {message}")]
    Provider { status: String, message: String },

    #[error("malformed geocoder response: {0}")]
    Malformed(String),

    #[error("no geocoding provider key configured")]
    MissingKey,
}

impl GeocodeError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GeocodeError::Transport(_) => "transport",
            GeocodeError::Timeout => "timeout",
            GeocodeError::Provider { .. } => "provider",
            GeocodeError::Malformed(_) => "malformed",
            GeocodeError::MissingKey => "missing_key",
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeocodeError::Timeout
        } else if err.is_decode() {
            GeocodeError::Malformed(err.to_string())
        } else {
            GeocodeError::Transport(err.to_string())
        }
    }
}
