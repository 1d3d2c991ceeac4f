//! Configuration for inference engines

use serde::{Deserialize, Serialize};

/// Which wire protocol the engine speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Google Generative Language API (`generateContent`)
    #[default]
    Gemini,
    /// OpenAI `chat/completions` and compatible servers
    #[serde(alias = "openai")]
    OpenAiCompatible,
}

/// Configuration for one inference engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub provider: Provider,

    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

const fn default_timeout_ms() -> u64 {
    60_000
}

const fn default_max_tokens() -> u32 {
    2048
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_top_p() -> f32 {
    0.95
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: default_base_url(),
            default_model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl InferenceConfig {
    /// OpenAI-compatible server, key read from `api_key_env`
    pub fn openai_compatible(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            provider: Provider::OpenAiCompatible,
            base_url: base_url.into(),
            default_model: model.into(),
            api_key_env: api_key_env.into(),
            ..Self::default()
        }
    }

    /// Base URL without a trailing slash
    pub(crate) fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_gemini() {
        let config = InferenceConfig::default();
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.default_model, "gemini-2.0-flash");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn provider_accepts_openai_alias() {
        let p: Provider = serde_json::from_str("\"openai\"").unwrap_or_default();
        assert_eq!(p, Provider::OpenAiCompatible);
    }

    #[test]
    fn api_root_trims_slash() {
        let config = InferenceConfig::openai_compatible("http://llm:8080/v1/", "m", "KEY");
        assert_eq!(config.api_root(), "http://llm:8080/v1");
        assert_eq!(config.provider, Provider::OpenAiCompatible);
    }
}
