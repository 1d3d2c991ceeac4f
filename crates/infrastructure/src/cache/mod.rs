//! In-memory caching
//!
//! - `MokaCache`: typed TTL cache with hit/miss counters
//! - cache keys are blake3 digests of their components

mod moka_cache;

pub use moka_cache::{CacheStats, MokaCache};

/// Generate a cache key from components using a blake3 hash
#[must_use]
pub fn generate_cache_key(prefix: &str, components: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for component in components {
        hasher.update(component.as_bytes());
        hasher.update(b"|");
    }
    format!("{prefix}:{}", hasher.finalize().to_hex())
}

/// Key of a forecast: rounded coordinates plus the day span
///
/// Coordinates are rounded to four decimals, so two geocoder hits for the
/// same town share one entry.
#[must_use]
pub fn forecast_cache_key(latitude: f64, longitude: f64, days: u8) -> String {
    let lat = format!("{latitude:.4}");
    let lon = format!("{longitude:.4}");
    let days = days.to_string();
    generate_cache_key("forecast", &[&lat, &lon, &days])
}

/// Key of a geocoding lookup, case and whitespace insensitive
#[must_use]
pub fn place_cache_key(query: &str) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    generate_cache_key("place", &[&normalized])
}
