//! HTTP server configuration.

use domain::AgentKind;
use serde::{Deserialize, Serialize};

use crate::telemetry::LogFormat;

use super::default_true;

/// Port of every agent, keyed by name in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPorts {
    #[serde(default = "default_weather_port")]
    pub weather: u16,
    #[serde(default = "default_beach_port")]
    pub beach: u16,
    #[serde(default = "default_planner_port")]
    pub planner: u16,
    #[serde(default = "default_travel_port")]
    pub travel: u16,
    #[serde(default = "default_host_port")]
    pub host: u16,
}

const fn default_weather_port() -> u16 {
    AgentKind::Weather.default_port()
}

const fn default_beach_port() -> u16 {
    AgentKind::Beach.default_port()
}

const fn default_planner_port() -> u16 {
    AgentKind::Planner.default_port()
}

const fn default_travel_port() -> u16 {
    AgentKind::Travel.default_port()
}

const fn default_host_port() -> u16 {
    AgentKind::Host.default_port()
}

impl Default for AgentPorts {
    fn default() -> Self {
        Self {
            weather: default_weather_port(),
            beach: default_beach_port(),
            planner: default_planner_port(),
            travel: default_travel_port(),
            host: default_host_port(),
        }
    }
}

impl AgentPorts {
    #[must_use]
    pub const fn port_for(&self, kind: AgentKind) -> u16 {
        match kind {
            AgentKind::Weather => self.weather,
            AgentKind::Beach => self.beach,
            AgentKind::Planner => self.planner,
            AgentKind::Travel => self.travel,
            AgentKind::Host => self.host,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Host name written into agent card URLs; defaults to `host`
    #[serde(default)]
    pub public_host: Option<String>,

    #[serde(default)]
    pub ports: AgentPorts,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (empty = any origin)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Graceful shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Log format: "json" for structured JSON logs, "text" for human-readable
    #[serde(default)]
    pub log_format: LogFormat,

    /// Maximum body size for JSON-RPC requests in bytes (default: 1MB)
    #[serde(default = "default_max_body_json")]
    pub max_body_size_json_bytes: usize,

    /// Put internal error details into JSON-RPC error messages
    #[serde(default)]
    pub expose_internal_errors: bool,

    /// Tasks kept in memory before the least used are evicted
    #[serde(default = "default_max_tasks")]
    pub max_tasks: u64,

    /// How long a task stays readable after its last update, in seconds
    #[serde(default = "default_task_ttl")]
    pub task_ttl_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_shutdown_timeout() -> u64 {
    30
}

const fn default_max_body_json() -> usize {
    1024 * 1024
}

const fn default_max_tasks() -> u64 {
    10_000
}

const fn default_task_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            public_host: None,
            ports: AgentPorts::default(),
            cors_enabled: true,
            allowed_origins: Vec::new(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            log_format: LogFormat::default(),
            max_body_size_json_bytes: default_max_body_json(),
            expose_internal_errors: false,
            max_tasks: default_max_tasks(),
            task_ttl_secs: default_task_ttl(),
        }
    }
}

impl ServerConfig {
    /// URL advertised on the agent card of a server listening on `port`
    #[must_use]
    pub fn public_url(&self, port: u16) -> String {
        let host = self.public_host.as_deref().unwrap_or(match self.host.as_str() {
            "0.0.0.0" | "::" => "localhost",
            host => host,
        });
        format!("http://{host}:{port}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_follow_agent_defaults() {
        let ports = AgentPorts::default();
        assert_eq!(ports.port_for(AgentKind::Weather), 10000);
        assert_eq!(ports.port_for(AgentKind::Planner), 10001);
        assert_eq!(ports.port_for(AgentKind::Beach), 10002);
        assert_eq!(ports.port_for(AgentKind::Host), 10010);
    }

    #[test]
    fn public_url_replaces_wildcard_address() {
        let mut config = ServerConfig::default();
        assert_eq!(config.public_url(10000), "http://127.0.0.1:10000/");

        config.host = "0.0.0.0".into();
        assert_eq!(config.public_url(10000), "http://localhost:10000/");

        config.public_host = Some("agents.example.com".into());
        assert_eq!(config.public_url(10002), "http://agents.example.com:10002/");
    }
}
