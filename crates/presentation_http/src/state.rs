//! Application state shared across handlers

use std::sync::Arc;

use application::{InferencePort, TaskService, WeatherPort};
use protocol_a2a::AgentCard;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Card served at the well-known paths
    pub card: Arc<AgentCard>,
    /// A2A task lifecycle of the agent
    pub tasks: Arc<TaskService>,
    /// Model behind the agent, probed by `/ready`
    pub inference: Arc<dyn InferencePort>,
    /// Weather provider, for agents that have one
    pub weather: Option<Arc<dyn WeatherPort>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("agent", &self.card.name)
            .field("tasks", &self.tasks)
            .field("model", &self.inference.current_model())
            .finish_non_exhaustive()
    }
}
