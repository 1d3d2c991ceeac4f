//! A2A client behaviour against a mock agent

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use futures::StreamExt;
use protocol_a2a::{A2aClient, A2aClientError, Message, StreamResponse, TaskState};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn mount_card(server: &MockServer, streaming: bool) {
    Mock::given(method("GET"))
        .and(path("/.well-known/agent.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Weather Agent",
            "description": "Forecasts",
            "url": format!("{}/", server.uri()),
            "version": "1.0.0",
            "protocolVersion": "0.3.0",
            "capabilities": {"streaming": streaming},
            "defaultInputModes": ["text"],
            "defaultOutputModes": ["text"],
            "skills": []
        })))
        .mount(server)
        .await;
}

// ============================================================================
// Card resolution
// ============================================================================

#[tokio::test]
async fn connect_resolves_card() {
    let server = MockServer::start().await;
    mount_card(&server, true).await;

    let client = A2aClient::connect(&server.uri(), TIMEOUT).await.unwrap();
    assert_eq!(client.card().name, "Weather Agent");
    assert!(client.card().capabilities.streaming);
}

#[tokio::test]
async fn card_falls_back_to_agent_card_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/agent.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/.well-known/agent-card.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Beach Agent",
            "description": "Beaches",
            "url": "http://localhost:10002/",
            "version": "1.0.0"
        })))
        .mount(&server)
        .await;

    let card = A2aClient::resolve_card(&server.uri()).await.unwrap();
    assert_eq!(card.name, "Beach Agent");
}

#[tokio::test]
async fn missing_card_reports_status() {
    let server = MockServer::start().await;
    let err = A2aClient::resolve_card(&server.uri()).await.unwrap_err();
    assert!(matches!(err, A2aClientError::Status { status: 404, .. }));
}

// ============================================================================
// message/send
// ============================================================================

#[tokio::test]
async fn send_message_returns_task() {
    let server = MockServer::start().await;
    mount_card(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "message/send"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": {
                "kind": "task",
                "id": "task-1",
                "contextId": "ctx-1",
                "status": {"state": "completed"},
                "artifacts": [{
                    "artifactId": "a1",
                    "parts": [{"kind": "text", "text": "Sunny in Miami"}]
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = A2aClient::connect(&server.uri(), TIMEOUT).await.unwrap();
    let result = client
        .send_message(Message::user_text("weather in Miami"), None)
        .await
        .unwrap();
    assert_eq!(result.text(), "Sunny in Miami");
}

#[tokio::test]
async fn rpc_error_is_surfaced_with_code() {
    let server = MockServer::start().await;
    mount_card(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {"code": -32001, "message": "Task not found: nope"}
        })))
        .mount(&server)
        .await;

    let client = A2aClient::connect(&server.uri(), TIMEOUT).await.unwrap();
    let err = client.get_task("nope", None).await.unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32001));
}

// ============================================================================
// message/stream
// ============================================================================

fn sse_frame(result: &serde_json::Value) -> String {
    let envelope = json!({"jsonrpc": "2.0", "id": "1", "result": result});
    format!("data: {envelope}\n\n")
}

#[tokio::test]
async fn stream_message_parses_sse_events() {
    let server = MockServer::start().await;
    mount_card(&server, true).await;

    let body = [
        sse_frame(&json!({
            "kind": "status-update", "taskId": "t", "contextId": "c",
            "status": {"state": "working"}, "final": false
        })),
        sse_frame(&json!({
            "kind": "artifact-update", "taskId": "t", "contextId": "c",
            "artifact": {"artifactId": "a", "parts": [{"kind": "text", "text": "Hot "}]},
            "append": false, "lastChunk": false
        })),
        sse_frame(&json!({
            "kind": "artifact-update", "taskId": "t", "contextId": "c",
            "artifact": {"artifactId": "a", "parts": [{"kind": "text", "text": "and sunny"}]},
            "append": true, "lastChunk": true
        })),
        sse_frame(&json!({
            "kind": "status-update", "taskId": "t", "contextId": "c",
            "status": {"state": "completed"}, "final": true
        })),
    ]
    .concat();

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "message/stream"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = A2aClient::connect(&server.uri(), TIMEOUT).await.unwrap();
    let events: Vec<StreamResponse> = client
        .stream_message(Message::user_text("weather"))
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    let text: String = events
        .iter()
        .filter_map(|e| match e {
            StreamResponse::ArtifactUpdate(update) => Some(update.artifact.text()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "Hot and sunny");
    assert!(matches!(
        events.last(),
        Some(StreamResponse::StatusUpdate(u)) if u.is_final && u.status.state == TaskState::Completed
    ));
}

#[tokio::test]
async fn stream_rejected_with_plain_json_error() {
    let server = MockServer::start().await;
    mount_card(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {"code": -32602, "message": "Message has no text"}
        })))
        .mount(&server)
        .await;

    let client = A2aClient::connect(&server.uri(), TIMEOUT).await.unwrap();
    let mut stream = client.stream_message(Message::user_text("")).await.unwrap();
    let first = stream.next().await.unwrap();
    assert_eq!(first.unwrap_err().rpc_code(), Some(-32602));
    assert!(stream.next().await.is_none());
}
