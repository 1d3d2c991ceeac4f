//! Open-Meteo forecast client

mod models;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use domain::{CurrentConditions, DailyForecast, WeatherCondition};
use reqwest::Client;
use tracing::{debug, instrument};

use self::models::{CURRENT_FIELDS, CurrentBlock, DAILY_FIELDS, DailyBlock, ForecastResponse};
use crate::{
    WeatherConfig, WeatherError,
    http::{build_client, check_status, decode, validate_coordinates},
};

/// Result of a forecast request
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMeteoForecast {
    pub current: CurrentConditions,
    pub daily: Vec<DailyForecast>,
    /// IANA zone the local times are expressed in
    pub timezone: Option<String>,
}

/// Worldwide weather lookups by coordinates
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError>;

    /// Current conditions plus `days` daily aggregates (clamped to 1..=16)
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<OpenMeteoForecast, WeatherError>;

    async fn is_healthy(&self) -> bool;
}

/// HTTP client for `api.open-meteo.com`
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        days: Option<u8>,
    ) -> Result<ForecastResponse, WeatherError> {
        validate_coordinates(latitude, longitude)?;

        let url = format!("{}/forecast", self.base_url);
        let mut query = vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        if let Some(days) = days {
            query.push(("daily", DAILY_FIELDS.to_string()));
            query.push(("forecast_days", days.clamp(1, 16).to_string()));
        }

        debug!(url = %url, ?days, "Requesting Open-Meteo forecast");
        let response = self.client.get(&url).query(&query).send().await?;
        check_status(&response)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WeatherError::RequestFailed("HTTP 404 Not Found".to_string()));
        }
        decode(response).await
    }
}

fn parse_local_time(s: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| WeatherError::ParseError(format!("Invalid local time: {s}")))
}

fn to_current(block: &CurrentBlock) -> Result<CurrentConditions, WeatherError> {
    Ok(CurrentConditions {
        observed_at: parse_local_time(&block.time)?,
        temperature_c: block.temperature_2m,
        apparent_temperature_c: block.apparent_temperature,
        humidity_pct: block.relative_humidity_2m,
        wind_speed_kmh: block.wind_speed_10m,
        wind_direction_deg: block.wind_direction_10m,
        precipitation_mm: block.precipitation,
        condition: WeatherCondition::from_wmo(block.weather_code),
    })
}

fn to_daily(block: &DailyBlock) -> Result<Vec<DailyForecast>, WeatherError> {
    let days = block.time.len();
    if block.weather_code.len() != days
        || block.temperature_2m_max.len() != days
        || block.temperature_2m_min.len() != days
    {
        return Err(WeatherError::ParseError(
            "Daily arrays have mismatched lengths".to_string(),
        ));
    }

    block
        .time
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| WeatherError::ParseError(format!("Invalid date {date}: {e}")))?;
            let local = |v: &Vec<String>| -> Result<Option<NaiveDateTime>, WeatherError> {
                v.get(i).map(|s| parse_local_time(s)).transpose()
            };

            Ok(DailyForecast {
                date,
                condition: WeatherCondition::from_wmo(block.weather_code[i]),
                temperature_max_c: block.temperature_2m_max[i],
                temperature_min_c: block.temperature_2m_min[i],
                precipitation_probability_pct: block
                    .precipitation_probability_max
                    .get(i)
                    .copied()
                    .flatten(),
                precipitation_mm: block.precipitation_sum.get(i).copied().flatten().unwrap_or(0.0),
                wind_speed_max_kmh: block.wind_speed_10m_max.get(i).copied().flatten().unwrap_or(0.0),
                uv_index_max: block.uv_index_max.get(i).copied().flatten(),
                sunrise: local(&block.sunrise)?,
                sunset: local(&block.sunset)?,
            })
        })
        .collect()
}

#[async_trait]
impl WeatherClient for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, WeatherError> {
        let response = self.fetch(latitude, longitude, None).await?;
        let current = response
            .current
            .ok_or_else(|| WeatherError::ParseError("Response has no current block".into()))?;
        to_current(&current)
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<OpenMeteoForecast, WeatherError> {
        let response = self.fetch(latitude, longitude, Some(days)).await?;
        let current = response
            .current
            .ok_or_else(|| WeatherError::ParseError("Response has no current block".into()))?;
        let daily = response
            .daily
            .ok_or_else(|| WeatherError::ParseError("Response has no daily block".into()))?;

        Ok(OpenMeteoForecast {
            current: to_current(&current)?,
            daily: to_daily(&daily)?,
            timezone: response.timezone,
        })
    }

    async fn is_healthy(&self) -> bool {
        // Equator / prime meridian: always answered, cheapest payload
        self.get_current(0.0, 0.0).await.is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn daily_block(days: usize) -> DailyBlock {
        DailyBlock {
            time: (1..=days).map(|d| format!("2026-07-0{d}")).collect(),
            weather_code: vec![0; days],
            temperature_2m_max: vec![30.0; days],
            temperature_2m_min: vec![20.0; days],
            precipitation_sum: vec![None; days],
            precipitation_probability_max: vec![Some(10); days],
            wind_speed_10m_max: vec![Some(12.0); days],
            uv_index_max: Vec::new(),
            sunrise: vec!["2026-07-01T06:01".to_string(); days],
            sunset: Vec::new(),
        }
    }

    #[test]
    fn parses_local_times_with_and_without_seconds() {
        assert!(parse_local_time("2026-07-04T13:00").is_ok());
        assert!(parse_local_time("2026-07-04T13:00:30").is_ok());
        assert!(parse_local_time("July 4th").is_err());
    }

    #[test]
    fn daily_tolerates_missing_optional_columns() {
        let days = to_daily(&daily_block(2)).unwrap();
        assert_eq!(days.len(), 2);
        assert!(days[0].uv_index_max.is_none());
        assert!(days[0].sunset.is_none());
        assert!(days[0].sunrise.is_some());
        assert!((days[1].precipitation_mm).abs() < f32::EPSILON);
        assert_eq!(days[1].precipitation_probability_pct, Some(10));
    }

    #[test]
    fn daily_rejects_mismatched_lengths() {
        let mut block = daily_block(3);
        block.temperature_2m_min.pop();
        assert!(matches!(to_daily(&block), Err(WeatherError::ParseError(_))));
    }

    #[tokio::test]
    async fn invalid_coordinates_fail_before_any_request() {
        let config = WeatherConfig::with_single_base("http://127.0.0.1:9");
        let client = OpenMeteoClient::new(&config).unwrap();
        let err = client.get_current(123.0, 0.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidCoordinates));
    }
}
