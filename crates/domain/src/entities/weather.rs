//! Weather entities shared by every forecast provider
//!
//! Open-Meteo delivers numeric daily aggregates; the National Weather
//! Service delivers named text periods ("Tonight", "Saturday"). A
//! [`WeatherReport`] carries whichever the provider produced, plus
//! any active alerts.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Place;

/// Sky/precipitation condition derived from a WMO weather interpretation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    FreezingDrizzle,
    Rain,
    FreezingRain,
    Snow,
    RainShowers,
    SnowShowers,
    Thunderstorm,
    ThunderstormWithHail,
    Unknown,
}

impl WeatherCondition {
    /// Map a WMO code (0-99) as used by Open-Meteo
    #[must_use]
    pub const fn from_wmo(code: u16) -> Self {
        match code {
            0 => Self::Clear,
            1 => Self::MostlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::FreezingDrizzle,
            61 | 63 | 65 => Self::Rain,
            66 | 67 => Self::FreezingRain,
            71 | 73 | 75 | 77 => Self::Snow,
            80..=82 => Self::RainShowers,
            85 | 86 => Self::SnowShowers,
            95 => Self::Thunderstorm,
            96 | 99 => Self::ThunderstormWithHail,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Clear => "Clear sky",
            Self::MostlyClear => "Mostly clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::FreezingDrizzle => "Freezing drizzle",
            Self::Rain => "Rain",
            Self::FreezingRain => "Freezing rain",
            Self::Snow => "Snow",
            Self::RainShowers => "Rain showers",
            Self::SnowShowers => "Snow showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::ThunderstormWithHail => "Thunderstorm with hail",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::MostlyClear => "🌤️",
            Self::PartlyCloudy => "⛅",
            Self::Overcast => "☁️",
            Self::Fog => "🌫️",
            Self::Drizzle | Self::Rain | Self::RainShowers => "🌧️",
            Self::FreezingDrizzle | Self::FreezingRain => "🌨️",
            Self::Snow | Self::SnowShowers => "❄️",
            Self::Thunderstorm | Self::ThunderstormWithHail => "⛈️",
            Self::Unknown => "❔",
        }
    }

    /// Dry and no worse than partly cloudy
    #[must_use]
    pub const fn is_beach_friendly(self) -> bool {
        matches!(self, Self::Clear | Self::MostlyClear | Self::PartlyCloudy)
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Where a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    OpenMeteo,
    NationalWeatherService,
}

impl ForecastSource {
    #[must_use]
    pub const fn attribution(self) -> &'static str {
        match self {
            Self::OpenMeteo => "Open-Meteo",
            Self::NationalWeatherService => "National Weather Service",
        }
    }
}

/// Conditions at the time of observation (metric units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Local time at the place
    pub observed_at: NaiveDateTime,
    pub temperature_c: f32,
    pub apparent_temperature_c: f32,
    pub humidity_pct: u8,
    pub wind_speed_kmh: f32,
    pub wind_direction_deg: u16,
    pub precipitation_mm: f32,
    pub condition: WeatherCondition,
}

/// Daily aggregate for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub temperature_max_c: f32,
    pub temperature_min_c: f32,
    pub precipitation_probability_pct: Option<u8>,
    pub precipitation_mm: f32,
    pub wind_speed_max_kmh: f32,
    pub uv_index_max: Option<f32>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

/// A named NWS forecast period ("This Afternoon", "Saturday Night")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub is_daytime: bool,
    pub temperature: i32,
    /// "F" or "C"
    pub temperature_unit: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

/// Active weather alert (NWS)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub event: String,
    pub severity: String,
    pub headline: Option<String>,
    pub area_description: String,
    pub description: String,
    pub instruction: Option<String>,
    pub effective: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
}

/// Everything known about the weather at a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub place: Place,
    pub source: ForecastSource,
    pub current: Option<CurrentConditions>,
    pub daily: Vec<DailyForecast>,
    pub periods: Vec<ForecastPeriod>,
    pub alerts: Vec<WeatherAlert>,
    pub generated_at: DateTime<Utc>,
}

impl WeatherReport {
    pub fn new(place: Place, source: ForecastSource) -> Self {
        Self {
            place,
            source,
            current: None,
            daily: Vec::new(),
            periods: Vec::new(),
            alerts: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// No forecast content at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.daily.is_empty() && self.periods.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::GeoLocation;

    #[test]
    fn wmo_mapping() {
        assert_eq!(WeatherCondition::from_wmo(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo(81), WeatherCondition::RainShowers);
        assert_eq!(
            WeatherCondition::from_wmo(99),
            WeatherCondition::ThunderstormWithHail
        );
        assert_eq!(WeatherCondition::from_wmo(42), WeatherCondition::Unknown);
    }

    #[test]
    fn beach_friendly_conditions() {
        assert!(WeatherCondition::Clear.is_beach_friendly());
        assert!(!WeatherCondition::Drizzle.is_beach_friendly());
        assert!(!WeatherCondition::Unknown.is_beach_friendly());
    }

    #[test]
    fn empty_report() {
        let place = Place::new("Waikiki", GeoLocation::new(21.28, -157.83).unwrap());
        let report = WeatherReport::new(place, ForecastSource::OpenMeteo);
        assert!(report.is_empty());
        assert_eq!(report.source.attribution(), "Open-Meteo");
    }
}
