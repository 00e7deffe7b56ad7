//! Error types and handling for the `EventWise` pipeline

use thiserror::Error;

/// Main error type for the `EventWise` pipeline
#[derive(Error, Debug)]
pub enum EventWiseError {
    /// Weather provider did not answer within the configured timeout
    #[error("Weather API timeout for location: {location}")]
    TransportTimeout { location: String },

    /// Weather provider rejected the location (HTTP 400)
    #[error("Invalid location: {location}")]
    InvalidLocation { location: String },

    /// A provider rejected the configured API key
    #[error("Invalid {service} API key")]
    InvalidCredentials { service: String },

    /// Any other weather-side failure
    #[error("Weather API error: {message}")]
    WeatherUnavailable { message: String },

    /// Generic model-side failure, message passed through from the provider
    #[error("Model provider error: {message}")]
    ProviderError { message: String },

    /// The model provider throttled the request (HTTP 429)
    #[error("Model provider rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    /// Any other failure while invoking the model
    #[error("Recommendation generation error: {message}")]
    GenerationFailed { message: String },

    /// The event store could not be opened or read
    #[error("Event catalog unavailable: {message}")]
    CatalogUnavailable { message: String },

    /// The generator was invoked without events
    #[error("Cannot generate a recommendation without events")]
    EmptyEventList,

    /// Required configuration was not provided at startup
    #[error("Missing required environment variables: {}", missing.join(", "))]
    ConfigurationMissing { missing: Vec<String> },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl EventWiseError {
    pub fn transport_timeout<S: Into<String>>(location: S) -> Self {
        Self::TransportTimeout {
            location: location.into(),
        }
    }

    pub fn invalid_location<S: Into<String>>(location: S) -> Self {
        Self::InvalidLocation {
            location: location.into(),
        }
    }

    pub fn invalid_credentials<S: Into<String>>(service: S) -> Self {
        Self::InvalidCredentials {
            service: service.into(),
        }
    }

    pub fn weather<S: Into<String>>(message: S) -> Self {
        Self::WeatherUnavailable {
            message: message.into(),
        }
    }

    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::ProviderError {
            message: message.into(),
        }
    }

    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    pub fn catalog<S: Into<String>>(message: S) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, sent alongside the message in HTTP error bodies
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            EventWiseError::TransportTimeout { .. } => "transport_timeout",
            EventWiseError::InvalidLocation { .. } => "invalid_location",
            EventWiseError::InvalidCredentials { .. } => "invalid_credentials",
            EventWiseError::WeatherUnavailable { .. } => "weather_unavailable",
            EventWiseError::ProviderError { .. } => "provider_error",
            EventWiseError::RateLimitExceeded => "rate_limit_exceeded",
            EventWiseError::GenerationFailed { .. } => "generation_failed",
            EventWiseError::CatalogUnavailable { .. } => "catalog_unavailable",
            EventWiseError::EmptyEventList => "empty_event_list",
            EventWiseError::ConfigurationMissing { .. } => "configuration_missing",
            EventWiseError::Validation { .. } => "validation",
        }
    }

    /// Weather failures that make the whole recommendation meaningless.
    ///
    /// A bad location or key will not fix itself, so the orchestrator stops.
    /// Everything else degrades to the "unavailable" placeholder.
    #[must_use]
    pub fn is_fatal_for_weather(&self) -> bool {
        matches!(
            self,
            EventWiseError::InvalidLocation { .. } | EventWiseError::InvalidCredentials { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EventWiseError::ConfigurationMissing { .. } => {
                format!("{self}. Set them in your environment or a .env file.")
            }
            EventWiseError::CatalogUnavailable { .. } => {
                "Event catalog unavailable. Run `eventwise seed` to create it.".to_string()
            }
            EventWiseError::TransportTimeout { .. } | EventWiseError::WeatherUnavailable { .. } => {
                format!("{self}. Please check your internet connection.")
            }
            _ => self.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EventWiseError {
    fn from(err: rusqlite::Error) -> Self {
        EventWiseError::catalog(err.to_string())
    }
}
