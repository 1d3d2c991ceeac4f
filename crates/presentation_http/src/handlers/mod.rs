//! HTTP request handlers

pub mod agent_card;
pub mod health;
pub mod jsonrpc;
