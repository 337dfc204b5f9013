use thiserror::Error;

use crate::provider::ProviderId;

/// Generic message used when the upstream gives no human-readable reason.
pub const GENERIC_UPSTREAM_MESSAGE: &str = "Failed to fetch weather data";

/// Failures surfaced by the weather gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required query parameter is missing or unusable.
    #[error("{0}")]
    InvalidRequest(String),

    /// The provider has no API key; raised before any network call.
    #[error("Weather API key not configured")]
    Configuration { provider: ProviderId },

    /// The upstream answered with a non-2xx status, an unreadable body,
    /// or could not be reached at all.
    #[error("{message}")]
    Upstream { status: Option<u16>, message: String },
}

impl GatewayError {
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn upstream<S: Into<String>>(status: Option<u16>, message: S) -> Self {
        Self::Upstream { status, message: message.into() }
    }
}

/// Failures of the search history log and its local cache.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("City is required")]
    CityRequired,

    /// The persisted cache is not a JSON array of entries.
    #[error("Malformed local search history: {0}")]
    MalformedLocalState(#[from] serde_json::Error),

    #[error("Local search history storage failed: {0}")]
    Storage(#[from] std::io::Error),
}
