//! Application configuration
//!
//! Layered like this, later sources winning:
//! 1. built-in defaults
//! 2. an optional `config.toml` (or any format the `config` crate reads)
//! 3. environment variables `BEACH_PARTY_<SECTION>__<KEY>`,
//!    e.g. `BEACH_PARTY_SERVER__LOG_FORMAT=json`
//!
//! Sub-modules by concern:
//! - `server`: bind address, ports, CORS, logging format
//! - `host`: remote agents of the host agent
//! - `resilience`: retries and circuit breakers

mod host;
mod resilience;
mod server;

use std::path::{Path, PathBuf};

use ai_core::InferenceConfig;
use domain::AgentKind;
use integration_weather::WeatherConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use host::HostConfig;
pub use resilience::ResilienceConfig;
pub use server::{AgentPorts, ServerConfig};

use crate::telemetry::TelemetryConfig;

const ENV_PREFIX: &str = "BEACH_PARTY";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Errors while loading configuration or credentials
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The variable named by `api_key_env` is unset or empty
    #[error("{0} environment variable not set.")]
    MissingApiKey(String),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Model used by the weather, beach and host agents
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Model used by the planner agents; falls back to `inference`
    #[serde(default)]
    pub planner_inference: Option<InferenceConfig>,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub resilience: ResilienceConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load `.env` into the process environment
    ///
    /// Returns the path of the file that was read, if any. Variables already
    /// set in the environment are not overridden.
    pub fn load_env_file() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    /// Load from `config.*` in the working directory and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(config::File::with_name("config").required(false))
    }

    /// Load from an explicit file and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("host.agent_urls")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Inference settings of an agent
    #[must_use]
    pub fn inference_for(&self, kind: AgentKind) -> &InferenceConfig {
        match kind {
            AgentKind::Planner | AgentKind::Travel => self
                .planner_inference
                .as_ref()
                .unwrap_or(&self.inference),
            AgentKind::Weather | AgentKind::Beach | AgentKind::Host => &self.inference,
        }
    }

    /// Read the API key named by `inference.api_key_env`
    pub fn require_api_key(inference: &InferenceConfig) -> Result<SecretString, ConfigError> {
        api_key_from(inference, |name| std::env::var(name).ok())
    }
}

fn api_key_from(
    inference: &InferenceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    lookup(&inference.api_key_env)
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingApiKey(inference.api_key_env.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use ai_core::Provider;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::telemetry::LogFormat;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.ports.weather, 10000);
        assert_eq!(config.inference.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.weather.nws_url, "https://api.weather.gov");
        assert_eq!(config.host.agent_urls.len(), 3);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
log_format = "json"

[server.ports]
weather = 11000

[planner_inference]
provider = "openai"
base_url = "http://localhost:11434/v1"
default_model = "llama3.2"
api_key_env = "OPENAI_API_KEY"

[weather]
cache_ttl_minutes = 5

[host]
agent_urls = ["http://weather:10000"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.server.ports.weather, 11000);
        assert_eq!(config.server.ports.beach, 10002);
        assert_eq!(config.weather.cache_ttl_minutes, 5);
        assert_eq!(config.host.agent_urls, vec!["http://weather:10000"]);

        let planner = config.inference_for(AgentKind::Travel);
        assert_eq!(planner.provider, Provider::OpenAiCompatible);
        assert_eq!(planner.default_model, "llama3.2");
        assert_eq!(
            config.inference_for(AgentKind::Weather).default_model,
            "gemini-2.0-flash"
        );
    }

    #[test]
    fn missing_file_is_an_error_for_load_from() {
        let result = AppConfig::load_from("/nonexistent/beach-party.toml");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn planner_falls_back_to_main_inference() {
        let config = AppConfig::default();
        assert_eq!(
            config.inference_for(AgentKind::Planner),
            &config.inference
        );
    }

    #[test]
    fn api_key_lookup() {
        let inference = InferenceConfig::default();

        let key = api_key_from(&inference, |name| {
            (name == "GOOGLE_API_KEY").then(|| "secret".to_string())
        })
        .unwrap();
        assert_eq!(key.expose_secret(), "secret");

        let err = api_key_from(&inference, |_| None).unwrap_err();
        assert_eq!(err.to_string(), "GOOGLE_API_KEY environment variable not set.");

        assert!(api_key_from(&inference, |_| Some("  ".into())).is_err());
    }
}
