//! Beach party CLI
//!
//! Starts the A2A agents, alone or all together, and talks to running agents.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod ask;
mod launcher;

use std::{process::ExitCode, time::Duration};

use clap::{Args, Parser, Subcommand};
use domain::AgentKind;
use infrastructure::{AppConfig, init_telemetry};
use tracing::info;

/// Beach party planner agents
#[derive(Debug, Parser)]
#[command(name = "beach-party")]
#[command(author, version, about = "Beach party planner A2A agents", long_about = None)]
struct Cli {
    /// Log filter, e.g. "debug" or "info,application=trace"
    #[arg(long, global = true, env = "BEACH_PARTY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the weather agent
    Weather(ServeArgs),

    /// Run the beach recommendation agent
    Beach(ServeArgs),

    /// Run the beach party planner agent
    Planner(ServeArgs),

    /// Run the travel planner agent
    Travel(ServeArgs),

    /// Run the host agent that delegates to the others
    Host(ServeArgs),

    /// Run weather, beach, planner and host in one process
    All {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,
    },

    /// Send a message to a running agent
    ///
    /// Example: beach-party ask http://localhost:10010 "Plan a beach party in Santa Monica"
    Ask {
        /// Base URL of the agent
        url: String,

        /// Message text
        text: String,

        /// Wait for the whole answer instead of streaming it
        #[arg(long)]
        no_stream: bool,

        /// Continue an earlier conversation
        #[arg(long)]
        context_id: Option<String>,
    },

    /// Print the agent card of a running agent
    Card {
        /// Base URL of the agent
        url: String,
    },
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (defaults to the agent's configured port)
    #[arg(short, long)]
    port: Option<u16>,
}

impl Commands {
    /// Client commands keep the console quiet unless asked otherwise
    const fn is_client(&self) -> bool {
        matches!(self, Self::Ask { .. } | Self::Card { .. })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env_file = AppConfig::load_env_file();
    let mut config = AppConfig::load()?;

    match cli.log_level {
        Some(filter) => config.telemetry.log_filter = filter,
        None if cli.command.is_client() => config.telemetry.log_filter = "warn".to_string(),
        None => {},
    }
    let _telemetry = init_telemetry(&config.telemetry, config.server.log_format)?;
    if let Some(path) = env_file {
        info!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Commands::Weather(args) => serve(AgentKind::Weather, args, config).await,
        Commands::Beach(args) => serve(AgentKind::Beach, args, config).await,
        Commands::Planner(args) => serve(AgentKind::Planner, args, config).await,
        Commands::Travel(args) => serve(AgentKind::Travel, args, config).await,
        Commands::Host(args) => serve(AgentKind::Host, args, config).await,
        Commands::All { host } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            launcher::serve_all(config).await
        },
        Commands::Ask {
            url,
            text,
            no_stream,
            context_id,
        } => {
            let options = ask::AskOptions {
                stream: !no_stream,
                context_id,
                timeout: Duration::from_secs(config.host.request_timeout_secs),
            };
            ask::ask(&url, &text, options).await
        },
        Commands::Card { url } => ask::print_card(&url).await,
    }
}

async fn serve(kind: AgentKind, args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    launcher::serve_one(kind, &config, args.port).await
}
