//! Weather service port
//!
//! Defines the interface for place lookup and forecast retrieval. Which
//! provider answers (NWS or Open-Meteo) is the adapter's business; the
//! report names its source.

use async_trait::async_trait;
use domain::{Place, UsState, WeatherAlert, WeatherReport};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for weather service operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherPort: Send + Sync {
    /// Geocode a free-form place name ("Santa Monica", "Miami, FL")
    ///
    /// Fails with [`ApplicationError::LocationNotFound`] when nothing matches.
    async fn resolve_place(&self, name: &str) -> Result<Place, ApplicationError>;

    /// Forecast for the next `days` days
    async fn forecast(&self, place: &Place, days: u8) -> Result<WeatherReport, ApplicationError>;

    /// Active alerts for a US state
    async fn alerts(&self, state: UsState) -> Result<Vec<WeatherAlert>, ApplicationError>;

    /// Check if the weather service is available
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WeatherPort>();
    }
}
