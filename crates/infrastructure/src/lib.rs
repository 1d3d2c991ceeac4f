//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: weather providers,
//! LLM engines, remote A2A agents and the task store. Also owns
//! configuration loading and telemetry setup.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod persistence;
pub mod retry;
pub mod telemetry;

pub use adapters::*;
pub use cache::{CacheStats, MokaCache, generate_cache_key};
pub use config::{AgentPorts, AppConfig, ConfigError, HostConfig, ResilienceConfig, ServerConfig};
pub use persistence::InMemoryTaskStore;
pub use retry::{RetryConfig, Retryable, retry};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryGuard, init_telemetry};
