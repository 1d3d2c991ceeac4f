//! Weather provider configuration

use serde::{Deserialize, Serialize};

/// Endpoints and limits for the weather providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo forecast API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Open-Meteo geocoding API base URL
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// National Weather Service API base URL
    #[serde(default = "default_nws_url")]
    pub nws_url: String,

    /// User-Agent sent to the NWS, which rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Forecast days when the query does not say (1-16)
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    /// How long forecasts stay cached, in minutes
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_minutes: u32,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_nws_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_user_agent() -> String {
    concat!("beach-party-weather/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_timeout() -> u64 {
    15
}

const fn default_forecast_days() -> u8 {
    3
}

const fn default_cache_ttl() -> u32 {
    15
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            geocoding_url: default_geocoding_url(),
            nws_url: default_nws_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            forecast_days: default_forecast_days(),
            cache_ttl_minutes: default_cache_ttl(),
        }
    }
}

impl WeatherConfig {
    /// Point every provider at one base URL (used with mock servers)
    #[must_use]
    pub fn with_single_base(base: &str) -> Self {
        Self {
            base_url: base.to_string(),
            geocoding_url: base.to_string(),
            nws_url: base.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_apis() {
        let config = WeatherConfig::default();
        assert_eq!(config.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.nws_url, "https://api.weather.gov");
        assert!(config.user_agent.starts_with("beach-party-weather/"));
        assert_eq!(config.forecast_days, 3);
    }

    #[test]
    fn partial_toml_style_json_uses_defaults() {
        let config: WeatherConfig =
            serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap_or_default();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.geocoding_url, "https://geocoding-api.open-meteo.com/v1");
    }
}
