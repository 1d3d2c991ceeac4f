//! Beach Party HTTP presentation layer
//!
//! Serves one agent over A2A: the agent card at the well-known paths,
//! JSON-RPC and SSE at `/`, plus liveness and readiness endpoints.

pub mod cards;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use cards::agent_card;
pub use error::{ApiError, set_expose_internal_errors};
pub use routes::create_router;
pub use server::{AgentServer, ServerError, shutdown_signal};
pub use state::AppState;
