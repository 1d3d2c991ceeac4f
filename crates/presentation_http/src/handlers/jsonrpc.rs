//! A2A JSON-RPC endpoint
//!
//! `message/stream` answers with server-sent events; every event's `data` is
//! a JSON-RPC response whose `result` is one stream event. All other methods
//! answer with a single JSON-RPC response. Protocol errors are reported in
//! the JSON-RPC envelope with HTTP status 200.

use std::convert::Infallible;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::StreamExt;
use protocol_a2a::{
    JsonRpcRequest, JsonRpcResponse, MessageSendParams, SendMessageResult,
    StreamResponse, Task, TaskIdParams, TaskQueryParams, jsonrpc::JSONRPC_VERSION, methods,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{error::ApiError, state::AppState};

/// Handle one JSON-RPC request
#[instrument(skip(state, body), fields(agent = %state.card.name, body_len = body.len()))]
pub async fn handle_rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_request(&body) {
        Ok(request) => request,
        Err((id, err)) => return rpc_error(id, &err),
    };
    let id = request.id.clone();
    debug!(method = %request.method, "JSON-RPC request");

    let result = match request.method.as_str() {
        methods::MESSAGE_SEND => message_send(&state, request.params).await,
        methods::MESSAGE_STREAM => {
            return match message_stream(&state, id.clone(), request.params).await {
                Ok(response) => response,
                Err(err) => rpc_error(id, &err),
            };
        },
        methods::TASKS_GET => tasks_get(&state, request.params).await,
        methods::TASKS_CANCEL => tasks_cancel(&state, request.params).await,
        methods::TASKS_RESUBSCRIBE => Err(ApiError::Unsupported(
            "Resubscribing to a running task is not supported".into(),
        )),
        methods::PUSH_CONFIG_SET | methods::PUSH_CONFIG_GET => Err(ApiError::PushNotSupported),
        other => Err(ApiError::MethodNotFound(other.to_string())),
    };

    match result {
        Ok(value) => Json(JsonRpcResponse::success(id, value)).into_response(),
        Err(err) => rpc_error(id, &err),
    }
}

/// Decode the envelope; on failure return the request id if it was readable
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, (Option<Value>, ApiError)> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| (None, ApiError::Parse(e.to_string())))?;
    let id = value.get("id").cloned();

    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| (id.clone(), ApiError::InvalidRequest(e.to_string())))?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err((
            id,
            ApiError::InvalidRequest(format!("Unsupported jsonrpc version: {}", request.jsonrpc)),
        ));
    }
    Ok(request)
}

fn rpc_error(id: Option<Value>, err: &ApiError) -> Response {
    let error = err.to_rpc_error();
    warn!(code = error.code, error = %err, "JSON-RPC request failed");
    Json(JsonRpcResponse::failure(id, error)).into_response()
}

fn params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, ApiError> {
    let params = params.ok_or_else(|| ApiError::InvalidParams("Missing params".into()))?;
    serde_json::from_value(params).map_err(|e| ApiError::InvalidParams(e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))
}

fn check_output_modes(state: &AppState, params: &MessageSendParams) -> Result<(), ApiError> {
    let Some(accepted) = params
        .configuration
        .as_ref()
        .map(|c| &c.accepted_output_modes)
        .filter(|modes| !modes.is_empty())
    else {
        return Ok(());
    };

    let offered = &state.card.default_output_modes;
    if accepted.iter().any(|mode| offered.contains(mode)) {
        Ok(())
    } else {
        Err(ApiError::ContentTypeNotSupported(format!(
            "requested {accepted:?}, offered {offered:?}"
        )))
    }
}

/// Tasks carry `"kind": "task"` on the wire
fn task_value(task: Task) -> Result<Value, ApiError> {
    to_value(&SendMessageResult::Task(task))
}

async fn message_send(state: &AppState, raw: Option<Value>) -> Result<Value, ApiError> {
    let params: MessageSendParams = params(raw)?;
    check_output_modes(state, &params)?;
    let config = params.configuration.unwrap_or_default();

    // non-blocking: answer with the submitted task, the turn keeps running
    if config.blocking == Some(false) {
        let mut events = state.tasks.stream(params.message).await?;
        return match events.next().await {
            Some(Ok(StreamResponse::Task(task))) => task_value(task),
            Some(Ok(_)) | None => Err(ApiError::Internal("Turn produced no task".into())),
            Some(Err(e)) => Err(e.into()),
        };
    }

    let mut task = state.tasks.send(params.message).await?;
    task.keep_last_history(config.history_length);
    task_value(task)
}

async fn message_stream(
    state: &AppState,
    id: Option<Value>,
    raw: Option<Value>,
) -> Result<Response, ApiError> {
    let params: MessageSendParams = params(raw)?;
    check_output_modes(state, &params)?;
    let events = state.tasks.stream(params.message).await?;

    let sse = events.map(move |event| {
        let response = match event.map_err(ApiError::from).and_then(|e| to_value(&e)) {
            Ok(result) => JsonRpcResponse::success(id.clone(), result),
            Err(err) => JsonRpcResponse::failure(id.clone(), err.to_rpc_error()),
        };
        Ok::<_, Infallible>(sse_event(&response))
    });

    Ok(Sse::new(sse).keep_alive(KeepAlive::default()).into_response())
}

fn sse_event(response: &JsonRpcResponse) -> Event {
    Event::default().json_data(response).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode stream event");
        Event::default().event("error").data(e.to_string())
    })
}

async fn tasks_get(state: &AppState, raw: Option<Value>) -> Result<Value, ApiError> {
    let params: TaskQueryParams = params(raw)?;
    let task = state.tasks.get(&params.id, params.history_length).await?;
    task_value(task)
}

async fn tasks_cancel(state: &AppState, raw: Option<Value>) -> Result<Value, ApiError> {
    let params: TaskIdParams = params(raw)?;
    let task = state.tasks.cancel(&params.id).await?;
    task_value(task)
}
