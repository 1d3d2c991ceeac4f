//! Agent executors
//!
//! An executor turns one user message into a stream of [`AgentEvent`]s.
//! The task service maps those events onto the A2A task lifecycle, so an
//! agent never deals with task ids, artifacts or wire types.

mod beach_agent;
mod host_agent;
mod planner_agent;
mod weather_agent;

use std::pin::Pin;

use domain::{AgentKind, ChatMessage, MessageRole};
use futures::Stream;

pub use beach_agent::{BeachAgent, RETRIEVAL_FAILED, STREAMING_FAILED};
pub use host_agent::HostAgent;
pub use planner_agent::{PLANNER_ERROR, PlannerAgent, PlannerPersona};
pub use weather_agent::{ASK_LOCATION, WeatherAgent};

/// One turn handed to an agent
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Text of the user message
    pub text: String,
    pub task_id: String,
    pub context_id: String,
    /// Earlier turns of the conversation, oldest first
    pub history: Vec<ChatMessage>,
    /// The caller consumes chunks as they arrive
    pub streaming: bool,
}

impl AgentRequest {
    /// Request with fresh ids and no history
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            task_id: uuid::Uuid::new_v4().to_string(),
            context_id: uuid::Uuid::new_v4().to_string(),
            history: Vec::new(),
            streaming: true,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub const fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }
}

/// Progress of an agent turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// Still busy; the note is shown as a status message
    Working(String),
    /// A piece of the answer
    Chunk(String),
    /// The agent needs the user to answer a question
    InputRequired(String),
    /// The answer is complete
    Completed,
    /// The turn failed; the reason is shown to the user
    Failed(String),
}

impl AgentEvent {
    /// Whether this event ends the turn
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(
            self,
            Self::InputRequired(_) | Self::Completed | Self::Failed(_)
        )
    }
}

/// Events of one agent turn
pub type AgentEventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

/// An agent that can answer A2A messages
pub trait AgentExecutor: Send + Sync {
    /// Which agent this is
    fn kind(&self) -> AgentKind;

    /// Run one turn
    ///
    /// The stream ends after its first final event.
    fn execute(&self, request: AgentRequest) -> AgentEventStream;
}

/// Prefix the message with the earlier turns, if there are any
pub(crate) fn with_conversation(history: &[ChatMessage], message: &str) -> String {
    let turns: Vec<String> = history
        .iter()
        .filter(|m| !m.is_blank())
        .map(|m| {
            let speaker = match m.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
                MessageRole::System => "System",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect();
    if turns.is_empty() {
        return message.to_string();
    }
    format!(
        "Conversation so far:\n{}\n\nCurrent message:\n{message}",
        turns.join("\n")
    )
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_events() {
        assert!(AgentEvent::Completed.is_final());
        assert!(AgentEvent::InputRequired("where?".into()).is_final());
        assert!(AgentEvent::Failed("x".into()).is_final());
        assert!(!AgentEvent::Chunk("x".into()).is_final());
        assert!(!AgentEvent::Working("x".into()).is_final());
    }

    #[test]
    fn conversation_prefix() {
        assert_eq!(with_conversation(&[], "hi"), "hi");
        let history = vec![
            ChatMessage::user("Plan a party"),
            ChatMessage::assistant("For how many people?"),
        ];
        let text = with_conversation(&history, "Twelve");
        assert!(text.starts_with("Conversation so far:\nUser: Plan a party\nAssistant: For how many people?"));
        assert!(text.ends_with("Current message:\nTwelve"));
    }
}
