//! AI Core - LLM inference engines
//!
//! Two providers sit behind the [`InferenceEngine`] port:
//! - [`GeminiInferenceEngine`] for the Google Generative Language API
//! - [`OpenAiInferenceEngine`] for any OpenAI-compatible `chat/completions` server
//!
//! [`create_engine`] picks one from an [`InferenceConfig`].

pub mod config;
pub mod error;
pub mod gemini;
pub mod openai;
pub mod ports;
mod sse;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

pub use config::{InferenceConfig, Provider};
pub use error::InferenceError;
pub use gemini::GeminiInferenceEngine;
pub use openai::OpenAiInferenceEngine;
pub use ports::{
    InferenceEngine, InferenceRequest, InferenceResponse, StreamingChunk, StreamingResponse,
    TokenUsage,
};

/// Build the engine selected by `config.provider`
///
/// A blank key is rejected up front instead of failing on the first request.
pub fn create_engine(
    config: InferenceConfig,
    api_key: SecretString,
) -> Result<Arc<dyn InferenceEngine>, InferenceError> {
    if api_key.expose_secret().trim().is_empty() {
        return Err(InferenceError::MissingApiKey(config.api_key_env));
    }
    Ok(match config.provider {
        Provider::Gemini => Arc::new(GeminiInferenceEngine::new(config, api_key)?),
        Provider::OpenAiCompatible => Arc::new(OpenAiInferenceEngine::new(config, api_key)?),
    })
}
