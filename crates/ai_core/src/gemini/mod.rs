//! Google Gemini engine (Generative Language REST API)

mod models;

use std::time::Duration;

use async_trait::async_trait;
use domain::MessageRole;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, instrument, warn};

use self::models::{Content, ContentPart, GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::{
    config::InferenceConfig,
    error::InferenceError,
    ports::{InferenceEngine, InferenceRequest, InferenceResponse, StreamingChunk, StreamingResponse, TokenUsage},
    sse,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini inference engine
pub struct GeminiInferenceEngine {
    client: Client,
    config: InferenceConfig,
    api_key: SecretString,
}

impl std::fmt::Debug for GeminiInferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiInferenceEngine")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.default_model)
            .finish_non_exhaustive()
    }
}

impl GeminiInferenceEngine {
    pub fn new(config: InferenceConfig, api_key: SecretString) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized Gemini inference engine"
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

    fn model_url(&self, model: &str, action: &str) -> String {
        format!("{}/models/{model}:{action}", self.config.api_root())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, self.api_key.expose_secret())
    }

    fn build_body(&self, request: &InferenceRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| Content {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![ContentPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: request.system_instruction().map(|text| Content {
                role: None,
                parts: vec![ContentPart { text: Some(text) }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(self.config.temperature),
                top_p: self.config.top_p,
                max_output_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            },
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, InferenceError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "Gemini request failed");
        Err(InferenceError::from_status(status, &body))
    }
}

#[async_trait]
impl InferenceEngine for GeminiInferenceEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate(
        &self,
        request: InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let model = self.resolve_model(&request).to_string();
        let body = self.build_body(&request);

        let response = self
            .send(self.client.post(self.model_url(&model, "generateContent")).json(&body))
            .await?;
        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        if parsed.candidates.is_empty() {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(InferenceError::InvalidResponse(format!(
                "Gemini returned no answer: {reason}"
            )));
        }

        let usage = parsed.usage_metadata.as_ref().map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });
        debug!(tokens = ?usage, "Gemini generation completed");

        Ok(InferenceResponse {
            content: parsed.text(),
            model: parsed.model_version.clone().unwrap_or(model),
            usage,
            finish_reason: parsed.finish_reason(),
        })
    }

    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate_stream(
        &self,
        request: InferenceRequest,
    ) -> Result<StreamingResponse, InferenceError> {
        let model = self.resolve_model(&request).to_string();
        let body = self.build_body(&request);

        let builder = self
            .client
            .post(self.model_url(&model, "streamGenerateContent"))
            .query(&[("alt", "sse")])
            .json(&body);
        let response = self.send(builder).await?;

        let chunks = sse::data_events(response)
            .and_then(move |data| {
                let model = model.clone();
                async move {
                    let parsed: GenerateContentResponse = serde_json::from_str(&data)
                        .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
                    let finish = parsed.finish_reason();
                    Ok(StreamingChunk {
                        content: parsed.text(),
                        done: finish.is_some(),
                        model: finish.map(|_| parsed.model_version.unwrap_or(model)),
                    })
                }
            })
            .boxed();

        Ok(chunks)
    }

    async fn health_check(&self) -> Result<bool, InferenceError> {
        let url = format!("{}/models/{}", self.config.api_root(), self.config.default_model);
        match self.send(self.client.get(url)).await {
            Ok(_) => Ok(true),
            Err(InferenceError::ModelNotAvailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use domain::ChatMessage;

    use super::*;

    fn engine() -> GeminiInferenceEngine {
        GeminiInferenceEngine::new(InferenceConfig::default(), SecretString::from("k")).unwrap()
    }

    #[test]
    fn body_moves_system_prompt_to_instruction() {
        let request = InferenceRequest::new(vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Weather?"),
            ChatMessage::assistant("Where?"),
            ChatMessage::user("Miami"),
        ]);
        let body = serde_json::to_value(engine().build_body(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn debug_hides_api_key() {
        let rendered = format!("{:?}", engine());
        assert!(!rendered.contains("api_key"));
    }

    #[test]
    fn model_url_shape() {
        assert_eq!(
            engine().model_url("gemini-2.0-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
