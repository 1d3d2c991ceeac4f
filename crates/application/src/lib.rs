//! Application layer - agents, task lifecycle and port definitions
//!
//! Each agent turns one user message into a stream of [`agents::AgentEvent`]s.
//! [`services::TaskService`] wraps an agent in the A2A task lifecycle, and the
//! ports describe everything the agents need from the outside world.

pub mod agents;
pub mod error;
mod llm_json;
pub mod ports;
pub mod report_formatter;
pub mod services;
pub mod weather_query;

pub use agents::{
    AgentEvent, AgentEventStream, AgentExecutor, AgentRequest, BeachAgent, HostAgent,
    PlannerAgent, PlannerPersona, WeatherAgent,
};
pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
pub use weather_query::{WeatherQuery, WeatherQueryParser};
