//! HTTP client for remote A2A agents

use std::{pin::Pin, time::Duration};

use eventsource_stream::Eventsource;
use futures::{Stream, TryStreamExt};
use reqwest::{Client, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    AGENT_CARD_PATH, AGENT_CARD_PATH_ALT, A2aClientError, AgentCard, JsonRpcRequest,
    JsonRpcResponse, Message, MessageSendConfig, MessageSendParams, SendMessageResult,
    StreamResponse, Task, TaskIdParams, TaskQueryParams, methods,
};

/// Events of a `message/stream` call, in arrival order
pub type A2aEventStream = Pin<Box<dyn Stream<Item = Result<StreamResponse, A2aClientError>> + Send>>;

/// Client bound to one remote agent
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: Client,
    card: AgentCard,
}

impl A2aClient {
    /// Client for an already known card
    pub fn new(card: AgentCard, timeout: Duration) -> Result<Self, A2aClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, card })
    }

    /// Fetch the card from `base_url` and build a client for it
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self, A2aClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        let card = Self::resolve_card_with(&http, base_url).await?;
        Ok(Self { http, card })
    }

    /// Fetch an agent card, trying `agent.json` then `agent-card.json`
    pub async fn resolve_card(base_url: &str) -> Result<AgentCard, A2aClientError> {
        Self::resolve_card_with(&Client::new(), base_url).await
    }

    #[instrument(skip(http))]
    async fn resolve_card_with(http: &Client, base_url: &str) -> Result<AgentCard, A2aClientError> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(A2aClientError::InvalidUrl(base_url.to_string()));
        }

        let mut last_err = None;
        for card_path in [AGENT_CARD_PATH, AGENT_CARD_PATH_ALT] {
            let url = format!("{base}{card_path}");
            debug!(url = %url, "Resolving agent card");
            match http.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    return decode_json(response).await;
                },
                Ok(response) => {
                    last_err = Some(status_error(response).await);
                },
                Err(err) => return Err(err.into()),
            }
        }
        Err(last_err.unwrap_or_else(|| A2aClientError::InvalidUrl(base_url.to_string())))
    }

    pub const fn card(&self) -> &AgentCard {
        &self.card
    }

    /// `message/send`: blocks until the agent finishes the turn
    #[instrument(skip(self, message), fields(agent = %self.card.name))]
    pub async fn send_message(
        &self,
        message: Message,
        configuration: Option<MessageSendConfig>,
    ) -> Result<SendMessageResult, A2aClientError> {
        let params = MessageSendParams {
            message,
            configuration,
        };
        self.call(methods::MESSAGE_SEND, &params).await
    }

    /// `message/stream`: returns the SSE event stream
    #[instrument(skip(self, message), fields(agent = %self.card.name))]
    pub async fn stream_message(&self, message: Message) -> Result<A2aEventStream, A2aClientError> {
        if !self.card.capabilities.streaming {
            warn!("Agent card does not advertise streaming; trying anyway");
        }
        let params = MessageSendParams {
            message,
            configuration: None,
        };
        let request = JsonRpcRequest::new(methods::MESSAGE_STREAM, to_value(&params)?);

        let response = self
            .http
            .post(&self.card.url)
            .header(header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        // A server may reject the call with a plain JSON-RPC error instead of SSE
        let is_sse = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        if !is_sse {
            let rpc: JsonRpcResponse = decode_json(response).await?;
            let result: Result<StreamResponse, _> = unwrap_rpc(rpc);
            return Ok(Box::pin(futures::stream::once(async move { result })));
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .map_err(|e| A2aClientError::Stream(e.to_string()))
            .try_filter(|event| futures::future::ready(!event.data.trim().is_empty()))
            .and_then(|event| async move {
                let rpc: JsonRpcResponse = serde_json::from_str(&event.data)
                    .map_err(|e| A2aClientError::Decode(e.to_string()))?;
                unwrap_rpc(rpc)
            });

        Ok(Box::pin(events))
    }

    /// `tasks/get`
    pub async fn get_task(
        &self,
        task_id: &str,
        history_length: Option<usize>,
    ) -> Result<Task, A2aClientError> {
        let params = TaskQueryParams {
            id: task_id.to_string(),
            history_length,
        };
        self.call(methods::TASKS_GET, &params).await
    }

    /// `tasks/cancel`
    pub async fn cancel_task(&self, task_id: &str) -> Result<Task, A2aClientError> {
        let params = TaskIdParams {
            id: task_id.to_string(),
        };
        self.call(methods::TASKS_CANCEL, &params).await
    }

    async fn call<P: Serialize + Sync, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, A2aClientError> {
        let request = JsonRpcRequest::new(method, to_value(params)?);
        let response = self.http.post(&self.card.url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let rpc: JsonRpcResponse = decode_json(response).await?;
        unwrap_rpc(rpc)
    }
}

fn to_value<P: Serialize>(params: &P) -> Result<Value, A2aClientError> {
    serde_json::to_value(params).map_err(|e| A2aClientError::Decode(e.to_string()))
}

fn unwrap_rpc<R: DeserializeOwned>(rpc: JsonRpcResponse) -> Result<R, A2aClientError> {
    if let Some(error) = rpc.error {
        return Err(A2aClientError::Rpc(error));
    }
    let result = rpc
        .result
        .ok_or_else(|| A2aClientError::Decode("Response has neither result nor error".into()))?;
    serde_json::from_value(result).map_err(|e| A2aClientError::Decode(e.to_string()))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, A2aClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| A2aClientError::Decode(e.to_string()))
}

async fn status_error(response: Response) -> A2aClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    A2aClientError::Status { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_rejects_non_http_urls() {
        let err = A2aClient::resolve_card("localhost:10000").await;
        assert!(matches!(err, Err(A2aClientError::InvalidUrl(_))));
    }

    #[test]
    fn unwrap_rpc_prefers_error() {
        let rpc = JsonRpcResponse::failure(None, crate::JsonRpcError::task_not_found("t1"));
        let err = unwrap_rpc::<Task>(rpc);
        assert!(matches!(err, Err(ref e) if e.rpc_code() == Some(-32001)));
    }
}
