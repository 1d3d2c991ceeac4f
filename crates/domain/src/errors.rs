//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Coordinates outside the valid latitude/longitude range
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: String, longitude: String },

    /// Name that does not match any known agent
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// Name or code that does not match any US state
    #[error("Unknown US state: {0}")]
    UnknownUsState(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create an invalid coordinates error from raw values
    pub fn invalid_coordinates(latitude: f64, longitude: f64) -> Self {
        Self::InvalidCoordinates {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_coordinates_keeps_values() {
        let err = DomainError::invalid_coordinates(95.5, 10.0);
        assert_eq!(
            err.to_string(),
            "Invalid coordinates: latitude 95.5, longitude 10"
        );
    }

    #[test]
    fn unknown_agent_display() {
        let err = DomainError::UnknownAgent("surf".to_string());
        assert_eq!(err.to_string(), "Unknown agent: surf");
    }
}
