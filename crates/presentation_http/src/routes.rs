//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};
use protocol_a2a::{AGENT_CARD_PATH, AGENT_CARD_PATH_ALT};

use crate::{handlers, state::AppState};

/// Create the A2A router of one agent
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Discovery
        .route(AGENT_CARD_PATH, get(handlers::agent_card::get_agent_card))
        .route(AGENT_CARD_PATH_ALT, get(handlers::agent_card::get_agent_card))
        // JSON-RPC (message/send, message/stream, tasks/*)
        .route("/", post(handlers::jsonrpc::handle_rpc))
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state)
}
