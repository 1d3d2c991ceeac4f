//! Weather data providers
//!
//! - [`OpenMeteoClient`]: worldwide current conditions and daily forecasts
//!   (<https://open-meteo.com>, no API key required)
//! - [`OpenMeteoGeocoder`]: place name search
//! - [`NwsClient`]: US forecasts and active alerts from the National Weather
//!   Service (<https://api.weather.gov>)

mod config;
mod error;
pub mod geocoding;
mod http;
pub mod nws;
pub mod open_meteo;

pub use config::WeatherConfig;
pub use error::WeatherError;
pub use geocoding::{Geocoder, OpenMeteoGeocoder};
pub use nws::{NwsClient, NwsForecast};
pub use open_meteo::{OpenMeteoClient, OpenMeteoForecast, WeatherClient};
