//! Inference errors

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API key rejected (401/403)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Inference timeout: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    /// No API key in the named environment variable
    #[error("{0} environment variable not set.")]
    MissingApiKey(String),
}

impl InferenceError {
    /// Classify a non-success HTTP answer
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = format!("HTTP {status}: {}", truncate(body, 300));
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(detail),
            StatusCode::NOT_FOUND => Self::ModelNotAvailable(detail),
            s if s.is_server_error() => Self::ServerError(detail),
            _ => Self::RequestFailed(detail),
        }
    }

    /// Whether the same request may succeed later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Timeout(_) | Self::RateLimited | Self::ServerError(_)
        )
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            InferenceError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            InferenceError::RateLimited
        ));
        assert!(matches!(
            InferenceError::from_status(StatusCode::FORBIDDEN, "bad key"),
            InferenceError::Unauthorized(_)
        ));
        assert!(matches!(
            InferenceError::from_status(StatusCode::BAD_GATEWAY, ""),
            InferenceError::ServerError(_)
        ));
        assert!(matches!(
            InferenceError::from_status(StatusCode::BAD_REQUEST, ""),
            InferenceError::RequestFailed(_)
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let err = InferenceError::from_status(StatusCode::BAD_REQUEST, &body);
        assert!(err.to_string().len() < 400);
    }

    #[test]
    fn retryable() {
        assert!(InferenceError::RateLimited.is_retryable());
        assert!(!InferenceError::Unauthorized(String::new()).is_retryable());
    }
}
