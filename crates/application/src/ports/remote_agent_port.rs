//! Remote agent port
//!
//! How the host agent reaches the agents it delegates to.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use protocol_a2a::TaskState;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// What the host knows about a delegate, taken from its agent card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAgentInfo {
    pub name: String,
    pub description: String,
    pub url: String,
    /// Skill names, used in the routing prompt
    pub skills: Vec<String>,
}

/// Answer of a delegate for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub agent: String,
    pub text: String,
    pub state: TaskState,
    pub task_id: Option<String>,
}

impl RemoteReply {
    /// The delegate asked a question instead of answering
    #[must_use]
    pub fn needs_input(&self) -> bool {
        self.state == TaskState::InputRequired
    }

    /// The delegate finished with an answer the host can pass on
    #[must_use]
    pub fn is_answer(&self) -> bool {
        self.state == TaskState::Completed
    }
}

/// Port for talking to other A2A agents
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteAgentPort: Send + Sync {
    /// Agents that can be delegated to
    async fn agents(&self) -> Result<Vec<RemoteAgentInfo>, ApplicationError>;

    /// Send one text message to the named agent and wait for its answer
    async fn send(
        &self,
        agent_name: &str,
        text: &str,
        context_id: Option<String>,
    ) -> Result<RemoteReply, ApplicationError>;
}
