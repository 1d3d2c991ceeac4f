//! Resilience configuration: retries and circuit breakers.

use serde::{Deserialize, Serialize};

use crate::{adapters::CircuitBreakerConfig, retry::RetryConfig};

/// Retry and circuit breaker settings shared by the adapters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Backoff for calls to remote agents
    #[serde(default)]
    pub retry: RetryConfig,

    /// Thresholds for the weather and LLM circuit breakers
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}
