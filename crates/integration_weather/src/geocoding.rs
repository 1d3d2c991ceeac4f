//! Place name resolution via the Open-Meteo geocoding API

use async_trait::async_trait;
use domain::{GeoLocation, Place, UsState};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    WeatherConfig, WeatherError,
    http::{build_client, check_status, decode},
};

/// Turns free-form place names into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Up to `count` candidates for a bare place name
    async fn search(&self, name: &str, count: u8) -> Result<Vec<Place>, WeatherError>;

    /// Best match for a query like "Santa Monica", "Santa Monica, CA"
    /// or "Nice, France"
    async fn resolve(&self, query: &str) -> Result<Place, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

impl SearchResult {
    fn into_place(self) -> Option<Place> {
        let location = GeoLocation::new(self.latitude, self.longitude).ok()?;
        let mut place = Place::new(self.name, location);
        place.country_code = self.country_code;
        place.admin1 = self.admin1;
        place.timezone = self.timezone;
        Some(place)
    }

    /// Does a user qualifier ("CA", "California", "France", "FR") describe this result?
    fn matches_qualifier(&self, qualifier: &str) -> bool {
        let q = qualifier.trim();
        let eq = |v: &Option<String>| v.as_deref().is_some_and(|s| s.eq_ignore_ascii_case(q));
        if eq(&self.admin1) || eq(&self.country) || eq(&self.country_code) {
            return true;
        }
        let is_us = self
            .country_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("US"));
        match (is_us, UsState::parse(q), self.admin1.as_deref()) {
            (true, Ok(state), Some(admin1)) => state.name().eq_ignore_ascii_case(admin1),
            _ => q.eq_ignore_ascii_case("usa") && is_us,
        }
    }
}

/// HTTP client for `geocoding-api.open-meteo.com`
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
}

impl OpenMeteoGeocoder {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.geocoding_url.trim_end_matches('/').to_string(),
        })
    }

    async fn raw_search(&self, name: &str, count: u8) -> Result<Vec<SearchResult>, WeatherError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::LocationNotFound(String::new()));
        }

        let url = format!("{}/search", self.base_url);
        debug!(url = %url, name, "Geocoding place");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", name.to_string()),
                ("count", count.clamp(1, 100).to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;
        check_status(&response)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(WeatherError::LocationNotFound(name.to_string()));
        }
        let body: SearchResponse = decode(response).await?;
        Ok(body.results)
    }
}

/// Split "City, Qualifier" into its parts
fn split_query(query: &str) -> (&str, Option<&str>) {
    match query.split_once(',') {
        Some((name, rest)) if !rest.trim().is_empty() => (name.trim(), Some(rest.trim())),
        Some((name, _)) => (name.trim(), None),
        None => (query.trim(), None),
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    #[instrument(skip(self))]
    async fn search(&self, name: &str, count: u8) -> Result<Vec<Place>, WeatherError> {
        let places: Vec<Place> = self
            .raw_search(name, count)
            .await?
            .into_iter()
            .filter_map(SearchResult::into_place)
            .collect();
        if places.is_empty() {
            return Err(WeatherError::LocationNotFound(name.trim().to_string()));
        }
        Ok(places)
    }

    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Result<Place, WeatherError> {
        let (name, qualifier) = split_query(query);
        let mut candidates = self.raw_search(name, 10).await?;

        let index = qualifier
            .and_then(|q| candidates.iter().position(|c| c.matches_qualifier(q)))
            .unwrap_or(0);

        if index >= candidates.len() {
            return Err(WeatherError::LocationNotFound(query.trim().to_string()));
        }
        candidates
            .swap_remove(index)
            .into_place()
            .ok_or_else(|| WeatherError::LocationNotFound(query.trim().to_string()))
    }
}
