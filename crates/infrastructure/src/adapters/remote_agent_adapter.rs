//! A2A remote agent adapter - implements `RemoteAgentPort` with protocol_a2a
//!
//! Agent cards are fetched lazily: the first call to [`RemoteAgentPort::agents`]
//! resolves every configured URL, and URLs that failed are tried again on
//! later calls. Agents started after the host are picked up that way.
//!
//! Card fetches retry on any transient failure. `message/send` starts a
//! turn on the remote agent, so it is only resent when the request never
//! got there.

use std::{collections::HashMap, time::Duration};

use application::{
    error::ApplicationError,
    ports::{RemoteAgentInfo, RemoteAgentPort, RemoteReply},
};
use async_trait::async_trait;
use protocol_a2a::{A2aClient, A2aClientError, Message, SendMessageResult, TaskState};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::retry::{RetryConfig, retry, retry_when};

/// Adapter holding one A2A client per resolved agent
#[derive(Debug)]
pub struct A2aRemoteAgentAdapter {
    urls: Vec<String>,
    timeout: Duration,
    retry: RetryConfig,
    /// Resolved clients keyed by configured URL
    clients: RwLock<HashMap<String, A2aClient>>,
}

impl A2aRemoteAgentAdapter {
    pub fn new(urls: Vec<String>, timeout: Duration, retry: RetryConfig) -> Self {
        Self {
            urls,
            timeout,
            retry,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the cards of every URL not resolved yet
    async fn resolve_pending(&self) {
        let pending: Vec<String> = {
            let clients = self.clients.read().await;
            self.urls
                .iter()
                .filter(|url| !clients.contains_key(*url))
                .cloned()
                .collect()
        };

        for url in pending {
            match retry(&self.retry, || A2aClient::connect(&url, self.timeout)).await {
                Ok(client) => {
                    info!(url = %url, agent = %client.card().name, "Remote agent resolved");
                    self.clients.write().await.insert(url, client);
                },
                Err(e) => warn!(url = %url, error = %e, "Remote agent unreachable"),
            }
        }
    }

    async fn client_for(&self, agent_name: &str) -> Result<A2aClient, ApplicationError> {
        self.resolve_pending().await;
        let clients = self.clients.read().await;
        clients
            .values()
            .find(|c| c.card().name.eq_ignore_ascii_case(agent_name.trim()))
            .cloned()
            .ok_or_else(|| ApplicationError::InvalidParams(format!("Unknown agent: {agent_name}")))
    }
}

#[async_trait]
impl RemoteAgentPort for A2aRemoteAgentAdapter {
    async fn agents(&self) -> Result<Vec<RemoteAgentInfo>, ApplicationError> {
        self.resolve_pending().await;
        let clients = self.clients.read().await;

        // configuration order, so routing prompts are stable
        Ok(self
            .urls
            .iter()
            .filter_map(|url| clients.get(url))
            .map(|client| {
                let card = client.card();
                RemoteAgentInfo {
                    name: card.name.clone(),
                    description: card.description.clone(),
                    url: card.url.clone(),
                    skills: card.skills.iter().map(|s| s.name.clone()).collect(),
                }
            })
            .collect())
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn send(
        &self,
        agent_name: &str,
        text: &str,
        context_id: Option<String>,
    ) -> Result<RemoteReply, ApplicationError> {
        let client = self.client_for(agent_name).await?;

        let result = retry_when(&self.retry, A2aClientError::is_undelivered, || {
            let mut message = Message::user_text(text);
            if let Some(ref context_id) = context_id {
                message = message.with_context_id(context_id.clone());
            }
            client.send_message(message, None)
        })
        .await
        .map_err(map_error)?;

        let text = result.text();
        let (state, task_id) = match result {
            SendMessageResult::Task(task) => (task.status.state, Some(task.id)),
            SendMessageResult::Message(_) => (TaskState::Completed, None),
        };
        debug!(agent = %client.card().name, state = ?state, "Remote agent replied");

        Ok(RemoteReply {
            agent: client.card().name.clone(),
            text,
            state,
            task_id,
        })
    }
}

fn map_error(err: A2aClientError) -> ApplicationError {
    if err.is_transient() {
        ApplicationError::ExternalService(err.to_string())
    } else {
        ApplicationError::Internal(format!("Remote agent error: {err}"))
    }
}
