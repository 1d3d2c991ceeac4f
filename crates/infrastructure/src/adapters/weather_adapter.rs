//! Weather adapter - implements `WeatherPort` with integration_weather
//!
//! US places are forecast by the National Weather Service first and fall
//! back to Open-Meteo when the NWS cannot answer. Everything else goes to
//! Open-Meteo. Places and reports are cached for the configured TTL.

use std::{fmt, sync::Arc, time::Duration};

use application::{error::ApplicationError, ports::WeatherPort};
use async_trait::async_trait;
use domain::{ForecastSource, Place, UsState, WeatherAlert, WeatherReport};
use integration_weather::{
    Geocoder, NwsClient, OpenMeteoClient, OpenMeteoGeocoder, WeatherClient, WeatherConfig,
    WeatherError,
};
use tracing::{debug, info, instrument, warn};

use super::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use crate::cache::{MokaCache, forecast_cache_key, place_cache_key};

const PLACE_CACHE_ENTRIES: u64 = 1_000;
const FORECAST_CACHE_ENTRIES: u64 = 500;
const PLACE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Adapter for the weather providers
pub struct WeatherAdapter {
    geocoder: Arc<dyn Geocoder>,
    open_meteo: Arc<dyn WeatherClient>,
    nws: NwsClient,
    open_meteo_breaker: CircuitBreaker,
    nws_breaker: CircuitBreaker,
    places: MokaCache<Place>,
    reports: MokaCache<WeatherReport>,
}

impl fmt::Debug for WeatherAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherAdapter")
            .field("open_meteo_breaker", &self.open_meteo_breaker.state())
            .field("nws_breaker", &self.nws_breaker.state())
            .field("reports", &self.reports.stats())
            .finish_non_exhaustive()
    }
}

impl WeatherAdapter {
    /// Create an adapter talking to the configured endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client fails to initialize.
    pub fn new(
        config: &WeatherConfig,
        breaker: &CircuitBreakerConfig,
    ) -> Result<Self, ApplicationError> {
        let geocoder = OpenMeteoGeocoder::new(config).map_err(map_error)?;
        let open_meteo = OpenMeteoClient::new(config).map_err(map_error)?;
        let nws = NwsClient::new(config).map_err(map_error)?;
        let ttl = Duration::from_secs(u64::from(config.cache_ttl_minutes) * 60);

        Ok(Self {
            geocoder: Arc::new(geocoder),
            open_meteo: Arc::new(open_meteo),
            nws,
            open_meteo_breaker: CircuitBreaker::with_config("open-meteo", breaker.clone()),
            nws_breaker: CircuitBreaker::with_config("nws", breaker.clone()),
            places: MokaCache::new("places", PLACE_CACHE_ENTRIES, PLACE_CACHE_TTL),
            reports: MokaCache::new("forecasts", FORECAST_CACHE_ENTRIES, ttl),
        })
    }

    #[instrument(skip(self, place), fields(place = %place.name))]
    async fn nws_report(&self, place: &Place, days: u8) -> Result<WeatherReport, ApplicationError> {
        let (lat, lon) = place.location.rounded();
        let forecast = self
            .nws_breaker
            .call(|| self.nws.point_forecast(lat, lon))
            .await
            .map_err(map_breaker_error)?;

        if forecast.periods.is_empty() {
            return Err(ApplicationError::ExternalService(
                "NWS returned no forecast periods".into(),
            ));
        }

        // one day and one night period per day
        let mut report = WeatherReport::new(place.clone(), ForecastSource::NationalWeatherService);
        report.periods = forecast
            .periods
            .into_iter()
            .take(usize::from(days) * 2)
            .collect();
        Ok(report)
    }

    #[instrument(skip(self, place), fields(place = %place.name))]
    async fn open_meteo_report(
        &self,
        place: &Place,
        days: u8,
    ) -> Result<WeatherReport, ApplicationError> {
        let forecast = self
            .open_meteo_breaker
            .call(|| {
                self.open_meteo.get_forecast(
                    place.location.latitude(),
                    place.location.longitude(),
                    days,
                )
            })
            .await
            .map_err(map_breaker_error)?;

        let mut report = WeatherReport::new(place.clone(), ForecastSource::OpenMeteo);
        report.current = Some(forecast.current);
        report.daily = forecast.daily;
        Ok(report)
    }
}

#[async_trait]
impl WeatherPort for WeatherAdapter {
    #[instrument(skip(self))]
    async fn resolve_place(&self, name: &str) -> Result<Place, ApplicationError> {
        let key = place_cache_key(name);
        if let Some(place) = self.places.get(&key).await {
            return Ok(place);
        }

        let place = self
            .open_meteo_breaker
            .call(|| self.geocoder.resolve(name))
            .await
            .map_err(map_breaker_error)?;

        debug!(resolved = %place.display_name(), "Place resolved");
        self.places.insert(key, place.clone()).await;
        Ok(place)
    }

    #[instrument(skip(self, place), fields(place = %place.display_name()))]
    async fn forecast(&self, place: &Place, days: u8) -> Result<WeatherReport, ApplicationError> {
        let days = days.clamp(1, 16);
        let key = forecast_cache_key(
            place.location.latitude(),
            place.location.longitude(),
            days,
        );
        if let Some(report) = self.reports.get(&key).await {
            return Ok(report);
        }

        let report = if place.is_us() {
            match self.nws_report(place, days).await {
                Ok(report) => report,
                Err(e) => {
                    warn!(error = %e, "NWS forecast failed, falling back to Open-Meteo");
                    self.open_meteo_report(place, days).await?
                },
            }
        } else {
            self.open_meteo_report(place, days).await?
        };

        info!(source = ?report.source, "Forecast retrieved");
        self.reports.insert(key, report.clone()).await;
        Ok(report)
    }

    #[instrument(skip(self), fields(state = %state))]
    async fn alerts(&self, state: UsState) -> Result<Vec<WeatherAlert>, ApplicationError> {
        self.nws_breaker
            .call(|| self.nws.active_alerts(state))
            .await
            .map_err(map_breaker_error)
    }

    async fn is_available(&self) -> bool {
        !self.open_meteo_breaker.is_open() && self.open_meteo.is_healthy().await
    }
}

fn map_error(err: WeatherError) -> ApplicationError {
    match err {
        WeatherError::LocationNotFound(name) => ApplicationError::LocationNotFound(name),
        WeatherError::RateLimitExceeded => ApplicationError::RateLimited,
        WeatherError::InvalidCoordinates => ApplicationError::InvalidParams(err.to_string()),
        WeatherError::ConnectionFailed(_)
        | WeatherError::RequestFailed(_)
        | WeatherError::ServiceUnavailable(_)
        | WeatherError::OutsideCoverage(_) => ApplicationError::ExternalService(err.to_string()),
        WeatherError::ParseError(_) => ApplicationError::Internal(err.to_string()),
    }
}

fn map_breaker_error(err: CircuitBreakerError<WeatherError>) -> ApplicationError {
    match err {
        CircuitBreakerError::Open(_) => ApplicationError::ExternalService(err.to_string()),
        CircuitBreakerError::Service(e) => map_error(e),
    }
}
