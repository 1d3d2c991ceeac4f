//! A named place resolved by geocoding

use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, UsState};

/// Geocoded place: a human name plus coordinates and administrative context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Place name as returned by the geocoder, e.g. "Santa Monica"
    pub name: String,
    /// ISO 3166-1 alpha-2 country code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// First-level administrative area (state, province, region)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    pub location: GeoLocation,
    /// IANA timezone name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Place {
    pub fn new(name: impl Into<String>, location: GeoLocation) -> Self {
        Self {
            name: name.into(),
            country_code: None,
            admin1: None,
            location,
            timezone: None,
        }
    }

    #[must_use]
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_admin1(mut self, admin1: impl Into<String>) -> Self {
        self.admin1 = Some(admin1.into());
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = Some(tz.into());
        self
    }

    /// Whether the place lies in the United States (NWS coverage)
    #[must_use]
    pub fn is_us(&self) -> bool {
        self.country_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("US"))
    }

    /// US state of the place, when it is in the US and the admin area is a state
    #[must_use]
    pub fn us_state(&self) -> Option<UsState> {
        if !self.is_us() {
            return None;
        }
        self.admin1.as_deref().and_then(|a| UsState::parse(a).ok())
    }

    /// "Name, Admin1, CC" with missing parts skipped
    #[must_use]
    pub fn display_name(&self) -> String {
        [
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn santa_monica() -> Place {
        Place::new("Santa Monica", GeoLocation::new(34.0195, -118.4912).unwrap())
            .with_admin1("California")
            .with_country_code("US")
    }

    #[test]
    fn display_name_joins_parts() {
        assert_eq!(santa_monica().display_name(), "Santa Monica, California, US");

        let bare = Place::new("Nice", GeoLocation::new(43.7, 7.27).unwrap());
        assert_eq!(bare.display_name(), "Nice");
    }

    #[test]
    fn us_detection() {
        assert!(santa_monica().is_us());
        let nice = Place::new("Nice", GeoLocation::new(43.7, 7.27).unwrap())
            .with_country_code("FR")
            .with_admin1("Provence-Alpes-Côte d'Azur");
        assert!(!nice.is_us());
        assert!(nice.us_state().is_none());
    }

    #[test]
    fn us_state_from_admin1() {
        assert_eq!(santa_monica().us_state().unwrap().code(), "CA");
    }
}
