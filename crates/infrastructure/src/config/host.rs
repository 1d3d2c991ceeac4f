//! Host agent configuration.

use serde::{Deserialize, Serialize};

/// Where the host agent finds the agents it delegates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base URLs of the remote agents, in routing preference order
    #[serde(default = "default_agent_urls")]
    pub agent_urls: Vec<String>,

    /// Timeout for one delegated request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_agent_urls() -> Vec<String> {
    vec![
        "http://localhost:10000".to_string(),
        "http://localhost:10002".to_string(),
        "http://localhost:10001".to_string(),
    ]
}

const fn default_request_timeout() -> u64 {
    120
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            agent_urls: default_agent_urls(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}
