//! Agent card handler

use axum::{Json, extract::State};
use protocol_a2a::AgentCard;

use crate::state::AppState;

/// Serve the agent card
pub async fn get_agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}
