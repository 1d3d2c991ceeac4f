//! Shared HTTP plumbing for the weather providers

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::{WeatherConfig, WeatherError};

pub(crate) fn build_client(config: &WeatherConfig) -> Result<Client, WeatherError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| WeatherError::ConnectionFailed(e.to_string()))
}

/// Map non-success statuses onto [`WeatherError`]; 404 is left to the caller
pub(crate) fn check_status(response: &Response) -> Result<(), WeatherError> {
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_FOUND {
        return Ok(());
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(WeatherError::RateLimitExceeded);
    }
    if status.is_server_error() {
        return Err(WeatherError::ServiceUnavailable(format!("HTTP {status}")));
    }
    Err(WeatherError::RequestFailed(format!("HTTP {status}")))
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, WeatherError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| WeatherError::ParseError(e.to_string()))
}

pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeatherError> {
    domain::GeoLocation::new(latitude, longitude)
        .map(|_| ())
        .map_err(|_| WeatherError::InvalidCoordinates)
}
