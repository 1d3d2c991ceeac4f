//! LLM inference adapter - implements `InferencePort` on an ai_core engine

use std::{sync::Arc, time::Instant};

use ai_core::{InferenceEngine, InferenceError, InferenceRequest};
use application::{
    error::ApplicationError,
    ports::{InferencePort, InferenceResult, InferenceStream},
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use super::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

/// Adapter exposing an [`InferenceEngine`] to the agents
#[derive(Debug)]
pub struct LlmInferenceAdapter {
    engine: Arc<dyn InferenceEngine>,
    breaker: CircuitBreaker,
}

impl LlmInferenceAdapter {
    pub fn new(engine: Arc<dyn InferenceEngine>, breaker: &CircuitBreakerConfig) -> Self {
        let name = format!("llm:{}", engine.default_model());
        Self {
            engine,
            breaker: CircuitBreaker::with_config(name, breaker.clone()),
        }
    }
}

#[async_trait]
impl InferencePort for LlmInferenceAdapter {
    #[instrument(skip(self, system_prompt, message), fields(model = %self.engine.default_model()))]
    async fn generate_with_system(
        &self,
        system_prompt: &str,
        message: &str,
    ) -> Result<InferenceResult, ApplicationError> {
        let start = Instant::now();
        let request = InferenceRequest::with_system(system_prompt, message);
        let response = self
            .breaker
            .call(|| self.engine.generate(request))
            .await
            .map_err(map_breaker_error)?;

        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(latency_ms, chars = response.content.len(), "Generation finished");

        Ok(InferenceResult {
            content: response.content,
            model: response.model,
            tokens_used: response.usage.map(|u| u.total_tokens),
            latency_ms,
        })
    }

    #[instrument(skip(self, system_prompt, message), fields(model = %self.engine.default_model()))]
    async fn stream_with_system(
        &self,
        system_prompt: &str,
        message: &str,
    ) -> Result<InferenceStream, ApplicationError> {
        let request = InferenceRequest::with_system(system_prompt, message);
        let stream = self
            .breaker
            .call(|| self.engine.generate_stream(request))
            .await
            .map_err(map_breaker_error)?;

        Ok(stream
            .map(|chunk| {
                chunk.map(|c| c.content).map_err(|e| {
                    warn!(error = %e, "Inference stream interrupted");
                    map_error(e)
                })
            })
            .boxed())
    }

    async fn is_healthy(&self) -> bool {
        match self.engine.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, "Inference health check failed");
                false
            },
        }
    }

    fn current_model(&self) -> String {
        self.engine.default_model().to_string()
    }
}

fn map_error(err: InferenceError) -> ApplicationError {
    match err {
        InferenceError::RateLimited => ApplicationError::RateLimited,
        InferenceError::ConnectionFailed(_)
        | InferenceError::Timeout(_)
        | InferenceError::ServerError(_) => ApplicationError::ExternalService(err.to_string()),
        InferenceError::RequestFailed(_)
        | InferenceError::Unauthorized(_)
        | InferenceError::ModelNotAvailable(_)
        | InferenceError::InvalidResponse(_)
        | InferenceError::StreamError(_) => ApplicationError::Inference(err.to_string()),
        InferenceError::MissingApiKey(_) => ApplicationError::Configuration(err.to_string()),
    }
}

fn map_breaker_error(err: CircuitBreakerError<InferenceError>) -> ApplicationError {
    match err {
        CircuitBreakerError::Open(_) => ApplicationError::ExternalService(err.to_string()),
        CircuitBreakerError::Service(e) => map_error(e),
    }
}
