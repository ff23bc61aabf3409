use thiserror::Error;

/// Failure taxonomy for both lookup pipelines.
///
/// The aggregation pipeline absorbs individual provider failures and only
/// ever reports `NoProviderAvailable`; the orchestrated pipeline surfaces
/// exactly one of these per search attempt.
#[derive(Debug, Error)]
pub enum Error {
    /// Geocoding returned zero matches for the requested place.
    #[error("City not found")]
    CityNotFound,

    /// No device location capability is available on this host.
    #[error("Location is not available on this device")]
    LocationUnavailable,

    /// The host location capability refused the request.
    #[error("Location access was denied")]
    LocationDenied,

    /// The host location capability did not answer in time.
    #[error("Timed out waiting for device location")]
    LocationTimeout,

    /// One of the current/forecast/air-pollution fetches failed.
    #[error("Failed to fetch weather data: {message}")]
    WeatherFetchFailed { message: String },

    /// Every configured condition provider failed to produce a reading.
    #[error("No weather provider returned a usable reading")]
    NoProviderAvailable,

    /// A required API key is absent from config and environment.
    #[error(
        "No API key configured for '{service}'.\n\
         Hint: run `skycast configure {service}` and enter your API key."
    )]
    MissingCredential { service: String },

    /// Transport-level failure (connect, timeout, unexpected HTTP status).
    #[error("Network error: {message}")]
    Network { message: String },

    /// A response body did not match the documented shape.
    #[error("Failed to parse provider response: {message}")]
    Parse { message: String },
}

impl Error {
    pub fn missing_credential(service: impl Into<String>) -> Self {
        Error::MissingCredential { service: service.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Error::Network { message: message.into() }
    }

    /// Message suitable for direct display to the user.
    ///
    /// Transport and parse failures collapse into a generic line; everything
    /// else already reads as a user-facing cause.
    pub fn user_message(&self) -> String {
        match self {
            Error::Network { .. } | Error::Parse { .. } => {
                "Failed to fetch weather data. Please try again.".to_string()
            }
            Error::WeatherFetchFailed { message } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network { message: err.to_string() }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse { message: err.to_string() }
    }
}
