//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Inference/AI error
    #[error("Inference error: {0}")]
    Inference(String),

    /// External service error (weather provider, remote agent)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Geocoding found nothing for the given name
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// No task with this id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task already reached a terminal state
    #[error("Task cannot be canceled: {0}")]
    TaskNotCancelable(String),

    /// Request parameters are unusable
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Operation exists in the protocol but is not offered here
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApplicationError::RateLimited | ApplicationError::ExternalService(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ApplicationError::RateLimited.is_retryable());
        assert!(ApplicationError::ExternalService("503".into()).is_retryable());
        assert!(!ApplicationError::TaskNotFound("t1".into()).is_retryable());
        assert!(!ApplicationError::InvalidParams("empty".into()).is_retryable());
    }

    #[test]
    fn domain_errors_pass_through() {
        let err: ApplicationError = DomainError::UnknownUsState("ZZ".into()).into();
        assert_eq!(err.to_string(), DomainError::UnknownUsState("ZZ".into()).to_string());
    }
}
