//! Port definitions for inference engines

use std::pin::Pin;

use async_trait::async_trait;
use domain::ChatMessage;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Request for inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the configured default model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl InferenceRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Single user turn
    pub fn simple(user: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(user)])
    }

    /// System instruction followed by one user turn
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Concatenated system messages, if any
    #[must_use]
    pub fn system_instruction(&self) -> Option<String> {
        let system: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == domain::MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();
        (!system.is_empty()).then(|| system.join("\n\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A delta of a streaming response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingChunk {
    pub content: String,
    /// Last chunk of the response
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

pub type StreamingResponse =
    Pin<Box<dyn Stream<Item = Result<StreamingChunk, InferenceError>> + Send>>;

/// Port for inference engine implementations
#[async_trait]
pub trait InferenceEngine: Send + Sync + std::fmt::Debug {
    /// Generate a complete response
    async fn generate(&self, request: InferenceRequest)
    -> Result<InferenceResponse, InferenceError>;

    /// Generate a response as a stream of deltas
    async fn generate_stream(
        &self,
        request: InferenceRequest,
    ) -> Result<StreamingResponse, InferenceError>;

    /// Whether the provider is reachable and the key is accepted
    async fn health_check(&self) -> Result<bool, InferenceError>;

    fn default_model(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_instruction_joins_system_messages() {
        let request = InferenceRequest::new(vec![
            ChatMessage::system("You are a weather expert."),
            ChatMessage::system("Answer in English."),
            ChatMessage::user("Is it sunny?"),
        ]);
        assert_eq!(
            request.system_instruction().as_deref(),
            Some("You are a weather expert.\n\nAnswer in English.")
        );
        assert!(InferenceRequest::simple("hi").system_instruction().is_none());
    }

    #[test]
    fn builders() {
        let request = InferenceRequest::with_system("s", "u")
            .with_model("gemini-2.5-pro")
            .with_temperature(0.2);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(request.temperature, Some(0.2));
    }
}
