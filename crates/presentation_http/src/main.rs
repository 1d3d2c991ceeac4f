//! Standalone A2A agent server
//!
//! `agent-server <weather|beach|planner|travel|host>`; the agent defaults to
//! `weather`. Host, ports and logging come from configuration.

use std::net::SocketAddr;

use anyhow::Context;
use domain::AgentKind;
use infrastructure::{AppConfig, init_telemetry};
use presentation_http::{AgentServer, shutdown_signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = AppConfig::load_env_file();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(&config.telemetry, config.server.log_format)?;

    if let Some(path) = env_file {
        info!(path = %path.display(), "Loaded environment file");
    }

    let kind: AgentKind = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => AgentKind::Weather,
    };

    let port = config.server.ports.port_for(kind);
    let addr: SocketAddr = format!("{}:{port}", config.server.host)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{port}", config.server.host))?;

    info!("{} v{} starting", kind.display_name(), env!("CARGO_PKG_VERSION"));
    AgentServer::new(kind, &config)?
        .serve(addr, shutdown_signal())
        .await?;
    Ok(())
}
