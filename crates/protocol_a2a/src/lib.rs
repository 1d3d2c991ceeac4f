//! A2A (Agent-to-Agent) protocol support
//!
//! Wire types for agent cards, messages, tasks and streaming events, the
//! JSON-RPC 2.0 envelope they travel in, and an HTTP client that talks to
//! any A2A-compliant agent (`message/send`, `message/stream` over SSE,
//! `tasks/get`, `tasks/cancel`).

mod agent_card;
mod client;
mod error;
pub mod jsonrpc;
mod types;

pub use agent_card::{AgentCapabilities, AgentCard, AgentCardBuilder, AgentProvider, AgentSkill};
pub use client::{A2aClient, A2aEventStream};
pub use error::A2aClientError;
pub use jsonrpc::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, MessageSendConfig, MessageSendParams,
    TaskIdParams, TaskQueryParams, error_codes, methods,
};
pub use types::{
    Artifact, FileContent, Message, Part, Role, SendMessageResult, StreamResponse, Task,
    TaskArtifactUpdateEvent, TaskState, TaskStatus, TaskStatusUpdateEvent,
};

/// Protocol version advertised on agent cards
pub const PROTOCOL_VERSION: &str = "0.3.0";

/// Well-known path of the agent card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Newer spelling of the agent card path, served as an alias
pub const AGENT_CARD_PATH_ALT: &str = "/.well-known/agent-card.json";
