//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod circuit_breaker;
mod inference_adapter;
mod remote_agent_adapter;
mod weather_adapter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use inference_adapter::LlmInferenceAdapter;
pub use remote_agent_adapter::A2aRemoteAgentAdapter;
pub use weather_adapter::WeatherAdapter;
