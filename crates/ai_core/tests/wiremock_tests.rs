//! Integration tests for the inference engines using WireMock

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ai_core::{
    GeminiInferenceEngine, InferenceConfig, InferenceEngine, InferenceError, InferenceRequest,
    OpenAiInferenceEngine, create_engine,
};
use futures::StreamExt;
use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

fn gemini_config(base_url: &str) -> InferenceConfig {
    InferenceConfig {
        base_url: base_url.to_string(),
        default_model: "gemini-test".to_string(),
        timeout_ms: 5000,
        ..InferenceConfig::default()
    }
}

fn openai_config(base_url: &str) -> InferenceConfig {
    InferenceConfig {
        timeout_ms: 5000,
        ..InferenceConfig::openai_compatible(format!("{base_url}/v1"), "gpt-test", "PLANNER_KEY")
    }
}

fn key() -> SecretString {
    SecretString::from("test-key")
}

async fn collect_text(engine: &dyn InferenceEngine, request: InferenceRequest) -> String {
    let mut stream = engine.generate_stream(request).await.unwrap();
    let mut out = String::new();
    while let Some(chunk) = stream.next().await {
        out.push_str(&chunk.unwrap().content);
    }
    out
}

// =============================================================================
// Gemini
// =============================================================================

#[tokio::test]
async fn gemini_generate_sends_key_and_system_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "systemInstruction": {"parts": [{"text": "You are a beach expert."}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Try "}, {"text": "Kamakura."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16},
            "modelVersion": "gemini-test-001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = GeminiInferenceEngine::new(gemini_config(&server.uri()), key()).unwrap();
    let response = engine
        .generate(InferenceRequest::with_system(
            "You are a beach expert.",
            "Beach near Tokyo?",
        ))
        .await
        .unwrap();

    assert_eq!(response.content, "Try Kamakura.");
    assert_eq!(response.model, "gemini-test-001");
    assert_eq!(response.usage.unwrap().total_tokens, 16);
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
}

#[tokio::test]
async fn gemini_blocked_prompt_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let engine = GeminiInferenceEngine::new(gemini_config(&server.uri()), key()).unwrap();
    let err = engine
        .generate(InferenceRequest::simple("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::InvalidResponse(msg) if msg.contains("SAFETY")));
}

#[tokio::test]
async fn gemini_stream_concatenates_sse_chunks() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Sunny \"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"all week.\"}]},\"finishReason\":\"STOP\"}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let engine = GeminiInferenceEngine::new(gemini_config(&server.uri()), key()).unwrap();
    let text = collect_text(&engine, InferenceRequest::simple("forecast")).await;
    assert_eq!(text, "Sunny all week.");
}

#[tokio::test]
async fn gemini_bad_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let engine = GeminiInferenceEngine::new(gemini_config(&server.uri()), key()).unwrap();
    let err = engine
        .generate(InferenceRequest::simple("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Unauthorized(_)));
}

#[tokio::test]
async fn gemini_health_check_reads_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models/gemini-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "models/gemini-test"
        })))
        .mount(&server)
        .await;

    let engine = GeminiInferenceEngine::new(gemini_config(&server.uri()), key()).unwrap();
    assert!(engine.health_check().await.unwrap());
}

// =============================================================================
// OpenAI-compatible
// =============================================================================

#[tokio::test]
async fn openai_generate_uses_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(serde_json::json!({"model": "gpt-test", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Bring sunscreen."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = OpenAiInferenceEngine::new(openai_config(&server.uri()), key()).unwrap();
    let response = engine
        .generate(InferenceRequest::simple("Beach party tips?"))
        .await
        .unwrap();
    assert_eq!(response.content, "Bring sunscreen.");
    assert_eq!(response.usage.unwrap().completion_tokens, 3);
}

#[tokio::test]
async fn openai_stream_stops_at_done() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Grill \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"at noon.\"},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let engine = create_engine(openai_config(&server.uri()), key()).unwrap();
    let text = collect_text(engine.as_ref(), InferenceRequest::simple("plan")).await;
    assert_eq!(text, "Grill at noon.");
}

#[tokio::test]
async fn openai_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let engine = OpenAiInferenceEngine::new(openai_config(&server.uri()), key()).unwrap();
    let err = engine
        .generate_stream(InferenceRequest::simple("plan"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, InferenceError::RateLimited));
    assert!(err.is_retryable());
}
