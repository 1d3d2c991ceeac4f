//! Weather provider errors

use thiserror::Error;

/// Errors from any of the weather providers
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Could not reach the provider (DNS, TLS, connect timeout)
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Provider answered with an unexpected status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    /// Provider reported a server-side failure (5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Geocoding returned no match
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// The NWS only covers US territory
    #[error("Location outside National Weather Service coverage: {0}")]
    OutsideCoverage(String),
}

impl WeatherError {
    /// Whether retrying the same request later may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::ServiceUnavailable(_) | Self::RateLimitExceeded
        )
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(WeatherError::RateLimitExceeded.is_transient());
        assert!(WeatherError::ServiceUnavailable("HTTP 503".into()).is_transient());
        assert!(!WeatherError::LocationNotFound("Atlantis".into()).is_transient());
        assert!(!WeatherError::InvalidCoordinates.is_transient());
    }
}
