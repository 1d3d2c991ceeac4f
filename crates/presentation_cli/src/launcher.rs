//! Starting agent servers
//!
//! `all` builds every agent before binding anything, so a missing API key
//! fails the whole launch instead of leaving a partial set running.

use anyhow::Context;
use domain::AgentKind;
use infrastructure::AppConfig;
use presentation_http::{AgentServer, ServerError, shutdown_signal};
use tokio::{net::TcpListener, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Agents the host delegates to when everything runs in one process
const REMOTE_AGENTS: [AgentKind; 3] = [AgentKind::Weather, AgentKind::Beach, AgentKind::Planner];

async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))
}

/// Run a single agent until Ctrl+C or SIGTERM
pub async fn serve_one(kind: AgentKind, config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let server = AgentServer::new(kind, config)?;
    let port = port.unwrap_or_else(|| config.server.ports.port_for(kind));
    let listener = bind(&config.server.host, port).await?;

    info!("{} v{} starting", kind.display_name(), env!("CARGO_PKG_VERSION"));
    server.serve_on(listener, shutdown_signal()).await?;
    Ok(())
}

/// Run weather, beach and planner plus a host wired to them
///
/// Everything stops on Ctrl+C or SIGTERM, or as soon as one server exits.
pub async fn serve_all(mut config: AppConfig) -> anyhow::Result<()> {
    let mut bound = Vec::with_capacity(REMOTE_AGENTS.len() + 1);
    let mut agent_urls = Vec::with_capacity(REMOTE_AGENTS.len());

    for kind in REMOTE_AGENTS {
        let server = AgentServer::new(kind, &config)?;
        let listener = bind(&config.server.host, config.server.ports.port_for(kind)).await?;
        agent_urls.push(config.server.public_url(listener.local_addr()?.port()));
        bound.push((server, listener));
    }

    config.host.agent_urls = agent_urls;
    let host = AgentServer::new(AgentKind::Host, &config)?;
    let listener = bind(&config.server.host, config.server.ports.port_for(AgentKind::Host)).await?;
    bound.push((host, listener));

    let token = CancellationToken::new();
    let mut servers = JoinSet::new();
    for (server, listener) in bound {
        let kind = server.kind();
        let stop = token.clone().cancelled_owned();
        servers.spawn(async move { (kind, server.serve_on(listener, stop).await) });
    }
    info!(agents = servers.len(), hosts = ?config.host.agent_urls, "All agents started");

    tokio::select! {
        () = shutdown_signal() => {},
        Some(joined) = servers.join_next() => {
            report_exit(joined);
            info!("An agent stopped, shutting down the others");
        },
    }

    token.cancel();
    while let Some(joined) = servers.join_next().await {
        report_exit(joined);
    }
    info!("All agents stopped");
    Ok(())
}

fn report_exit(joined: Result<(AgentKind, Result<(), ServerError>), tokio::task::JoinError>) {
    match joined {
        Ok((kind, Ok(()))) => info!(agent = %kind, "Agent exited"),
        Ok((kind, Err(e))) => error!(agent = %kind, error = %e, "Agent failed"),
        Err(e) => error!(error = %e, "Agent task panicked"),
    }
}
