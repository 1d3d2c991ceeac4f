use thiserror::Error;

use crate::JsonRpcError;

/// Errors raised by [`crate::A2aClient`]
#[derive(Debug, Error)]
pub enum A2aClientError {
    /// Transport failure (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent answered with a non-success HTTP status
    #[error("Agent returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The agent answered with a JSON-RPC error object
    #[error("JSON-RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Body was not the JSON we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// SSE framing broke mid-stream
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid agent URL: {0}")]
    InvalidUrl(String),
}

impl A2aClientError {
    /// JSON-RPC error code, when the failure was an RPC error
    #[must_use]
    pub const fn rpc_code(&self) -> Option<i32> {
        match self {
            Self::Rpc(err) => Some(err.code),
            _ => None,
        }
    }

    /// Whether a retry could help
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The request never reached the agent
    ///
    /// Only these failures are safe to resend for calls that start work on
    /// the agent, since a timed-out request may still be running there.
    #[must_use]
    pub fn is_undelivered(&self) -> bool {
        matches!(self, Self::Http(err) if err.is_connect())
    }
}
