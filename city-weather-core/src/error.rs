//! Structured errors for the weather pipeline.
//!
//! Callers branch on [`WeatherError::kind`]: a `NotFound` is something the
//! user can fix by changing the city name, everything under `Upstream` is not.

use thiserror::Error;

/// Error returned by every stage of the weather pipeline.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City '{city}' could not be resolved: {message}")]
    NotFound { city: String, message: String },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Provider unreachable, rejected the request, or answered with something unusable.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Request to OpenWeather {endpoint} endpoint failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("OpenWeather {endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse OpenWeather {endpoint} JSON")]
    InvalidJson {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Malformed(#[from] MalformedResponseError),
}

/// Payload parsed as JSON but lacks something the pipeline needs.
#[derive(Debug, Error)]
pub enum MalformedResponseError {
    #[error("Forecast response has no 'list' field")]
    MissingList,

    #[error("Forecast 'list' field is not an array")]
    ListNotArray,

    #[error("Forecast response contained no periods")]
    EmptyList,

    #[error("Forecast period {index} could not be read")]
    InvalidPeriod {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Period timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Coarse classification of a [`WeatherError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Upstream,
    MalformedResponse,
}

impl WeatherError {
    pub fn not_found(city: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            city: city.into(),
            message: message.into(),
        }
    }

    /// Most specific kind; a malformed response is still an upstream failure,
    /// see [`WeatherError::is_upstream`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream(UpstreamError::Malformed(_)) => ErrorKind::MalformedResponse,
            Self::Upstream(_) => ErrorKind::Upstream,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }

    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<MalformedResponseError> for WeatherError {
    fn from(err: MalformedResponseError) -> Self {
        Self::Upstream(UpstreamError::Malformed(err))
    }
}
