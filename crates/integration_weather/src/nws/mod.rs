//! National Weather Service client (US only)
//!
//! Forecasts take two hops: `/points/{lat},{lon}` names the forecast office
//! grid, and the `forecast` URL it returns lists the text periods.

mod models;

use domain::{ForecastPeriod, UsState, WeatherAlert};
use reqwest::{Client, StatusCode, header};
use tracing::{debug, instrument};

use self::models::{AlertCollection, ForecastResponse, Period, PointResponse};
use crate::{
    WeatherConfig, WeatherError,
    http::{build_client, check_status, decode, validate_coordinates},
};

const GEO_JSON: &str = "application/geo+json";

/// Forecast periods plus the NWS's own idea of the nearest town
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NwsForecast {
    pub periods: Vec<ForecastPeriod>,
    /// "City, ST" of the grid point, when the NWS reports one
    pub relative_location: Option<String>,
}

/// HTTP client for `api.weather.gov`
#[derive(Debug, Clone)]
pub struct NwsClient {
    client: Client,
    base_url: String,
}

impl NwsClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.nws_url.trim_end_matches('/').to_string(),
        })
    }

    /// Text forecast periods for a US point
    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    pub async fn point_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<NwsForecast, WeatherError> {
        validate_coordinates(latitude, longitude)?;

        let url = format!("{}/points/{latitude:.4},{longitude:.4}", self.base_url);
        debug!(url = %url, "Resolving NWS grid point");
        let response = self.get(&url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(WeatherError::OutsideCoverage(format!(
                "{latitude:.4},{longitude:.4}"
            )));
        }
        let point: PointResponse = decode(response).await?;

        let forecast_url = point.properties.forecast.ok_or_else(|| {
            WeatherError::OutsideCoverage(format!("{latitude:.4},{longitude:.4}"))
        })?;
        let relative_location = point
            .properties
            .relative_location
            .map(|r| format!("{}, {}", r.properties.city, r.properties.state));

        debug!(url = %forecast_url, "Fetching NWS forecast");
        let response = self.get(&forecast_url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(WeatherError::RequestFailed(format!(
                "Forecast grid not found: {forecast_url}"
            )));
        }
        let forecast: ForecastResponse = decode(response).await?;

        Ok(NwsForecast {
            periods: forecast
                .properties
                .periods
                .into_iter()
                .map(to_period)
                .collect(),
            relative_location,
        })
    }

    /// Currently active alerts for a state
    #[instrument(skip(self), fields(state = %state))]
    pub async fn active_alerts(&self, state: UsState) -> Result<Vec<WeatherAlert>, WeatherError> {
        let url = format!("{}/alerts/active", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, GEO_JSON)
            .query(&[("area", state.code())])
            .send()
            .await?;
        check_status(&response)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let alerts: AlertCollection = decode(response).await?;
        debug!(count = alerts.features.len(), "Active alerts received");

        Ok(alerts
            .features
            .into_iter()
            .map(|f| {
                let p = f.properties;
                WeatherAlert {
                    event: p.event,
                    severity: p.severity,
                    headline: p.headline,
                    area_description: p.area_desc,
                    description: p.description,
                    instruction: p.instruction,
                    effective: p.effective,
                    expires: p.expires,
                }
            })
            .collect())
    }

    /// `/` answers with a small status document when the API is up
    pub async fn is_healthy(&self) -> bool {
        match self.get(&format!("{}/", self.base_url)).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, WeatherError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, GEO_JSON)
            .send()
            .await?;
        check_status(&response)?;
        Ok(response)
    }
}

fn to_period(p: Period) -> ForecastPeriod {
    ForecastPeriod {
        name: p.name,
        start_time: p.start_time,
        is_daytime: p.is_daytime,
        temperature: p.temperature,
        temperature_unit: p.temperature_unit,
        wind_speed: p.wind_speed.unwrap_or_default(),
        wind_direction: p.wind_direction.unwrap_or_default(),
        short_forecast: p.short_forecast,
        detailed_forecast: p.detailed_forecast,
    }
}
