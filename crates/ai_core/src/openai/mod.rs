//! OpenAI-compatible `chat/completions` engine
//!
//! Works against OpenAI itself and the many servers that mimic it
//! (vLLM, LiteLLM, llama.cpp server, OpenRouter).

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, future};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::InferenceConfig,
    error::InferenceError,
    ports::{InferenceEngine, InferenceRequest, InferenceResponse, StreamingChunk, StreamingResponse, TokenUsage},
    sse,
};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: domain::MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    delta: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Engine for OpenAI-compatible servers
pub struct OpenAiInferenceEngine {
    client: Client,
    config: InferenceConfig,
    api_key: SecretString,
}

impl std::fmt::Debug for OpenAiInferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiInferenceEngine")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.default_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiInferenceEngine {
    pub fn new(config: InferenceConfig, api_key: SecretString) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized OpenAI-compatible inference engine"
        );

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn resolve_model<'a>(&'a self, request: &'a InferenceRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }

    fn body<'a>(&'a self, request: &'a InferenceRequest, stream: bool) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: self.resolve_model(request),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature.unwrap_or(self.config.temperature),
            top_p: self.config.top_p,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            stream,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, InferenceError> {
        let response = builder
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Chat completion request failed");
        Err(InferenceError::from_status(status, &body))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.api_root())
    }
}

fn parse_stream_event(data: &str, model: &str) -> Result<Option<StreamingChunk>, InferenceError> {
    if data.trim() == DONE_SENTINEL {
        return Ok(Some(StreamingChunk {
            content: String::new(),
            done: true,
            model: Some(model.to_string()),
        }));
    }
    let parsed: ChatCompletionResponse =
        serde_json::from_str(data).map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
    let Some(choice) = parsed.choices.into_iter().next() else {
        // usage-only trailer some servers send before [DONE]
        return Ok(None);
    };
    let content = choice
        .delta
        .or(choice.message)
        .and_then(|m| m.content)
        .unwrap_or_default();
    Ok(Some(StreamingChunk {
        content,
        done: false,
        model: None,
    }))
}

#[async_trait]
impl InferenceEngine for OpenAiInferenceEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate(
        &self,
        request: InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let body = self.body(&request, false);
        let response = self
            .send(self.client.post(self.url("chat/completions")).json(&body))
            .await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let usage = parsed.usage.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });
        let model = parsed
            .model
            .clone()
            .unwrap_or_else(|| self.resolve_model(&request).to_string());
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidResponse("Response has no choices".into()))?;
        debug!(tokens = ?usage, "Chat completion finished");

        Ok(InferenceResponse {
            content: choice.message.and_then(|m| m.content).unwrap_or_default(),
            model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate_stream(
        &self,
        request: InferenceRequest,
    ) -> Result<StreamingResponse, InferenceError> {
        let model = self.resolve_model(&request).to_string();
        let body = self.body(&request, true);
        let response = self
            .send(self.client.post(self.url("chat/completions")).json(&body))
            .await?;

        let chunks = sse::data_events(response)
            .map(move |event| event.and_then(|data| parse_stream_event(&data, &model)))
            .filter_map(|parsed| async move { parsed.transpose() })
            // stop after the sentinel; some servers keep the connection open
            .scan(false, |finished, item| {
                if *finished {
                    return future::ready(None);
                }
                if matches!(&item, Ok(chunk) if chunk.done) {
                    *finished = true;
                }
                future::ready(Some(item))
            })
            .boxed();

        Ok(chunks)
    }

    async fn health_check(&self) -> Result<bool, InferenceError> {
        match self.send(self.client.get(self.url("models"))).await {
            Ok(_) => Ok(true),
            Err(InferenceError::ModelNotAvailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
