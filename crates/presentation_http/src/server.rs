//! Agent server bootstrap
//!
//! Wires the adapters of one agent kind into its executor, wraps the
//! executor in a task service and serves the A2A router.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use ai_core::InferenceError;
use application::{
    AgentExecutor, ApplicationError, BeachAgent, HostAgent, InferencePort, PlannerAgent,
    PlannerPersona, TaskService, TaskStorePort, WeatherAgent, WeatherPort, WeatherQueryParser,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use domain::AgentKind;
use infrastructure::{
    A2aRemoteAgentAdapter, AppConfig, ConfigError, InMemoryTaskStore, LlmInferenceAdapter,
    ServerConfig, WeatherAdapter,
};
use thiserror::Error;
use tokio::{net::TcpListener, signal, sync::oneshot};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{cards::agent_card, error::set_expose_internal_errors, routes, state::AppState};

/// Errors while setting up or running an agent server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to initialize inference: {0}")]
    Inference(#[from] InferenceError),

    #[error("Failed to initialize agent: {0}")]
    Setup(#[from] ApplicationError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One A2A agent ready to be served
pub struct AgentServer {
    kind: AgentKind,
    tasks: Arc<TaskService>,
    inference: Arc<dyn InferencePort>,
    weather: Option<Arc<dyn WeatherPort>>,
    server: ServerConfig,
}

impl std::fmt::Debug for AgentServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentServer")
            .field("kind", &self.kind)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl AgentServer {
    /// Build the agent `kind` from configuration
    ///
    /// Fails when the API key of the agent's model is not set.
    pub fn new(kind: AgentKind, config: &AppConfig) -> Result<Self, ServerError> {
        let inference_config = config.inference_for(kind);
        let api_key = AppConfig::require_api_key(inference_config)?;
        let engine = ai_core::create_engine(inference_config.clone(), api_key)?;
        let breaker = &config.resilience.circuit_breaker;
        let inference: Arc<dyn InferencePort> = Arc::new(LlmInferenceAdapter::new(engine, breaker));

        let mut weather: Option<Arc<dyn WeatherPort>> = None;
        let executor: Arc<dyn AgentExecutor> = match kind {
            AgentKind::Weather => {
                let adapter: Arc<dyn WeatherPort> =
                    Arc::new(WeatherAdapter::new(&config.weather, breaker)?);
                weather = Some(Arc::clone(&adapter));
                Arc::new(WeatherAgent::new(
                    adapter,
                    Arc::clone(&inference),
                    WeatherQueryParser::new(config.weather.forecast_days),
                ))
            },
            AgentKind::Beach => Arc::new(BeachAgent::new(Arc::clone(&inference))),
            AgentKind::Planner => Arc::new(PlannerAgent::new(
                Arc::clone(&inference),
                PlannerPersona::BeachParty,
            )),
            AgentKind::Travel => {
                Arc::new(PlannerAgent::new(Arc::clone(&inference), PlannerPersona::Travel))
            },
            AgentKind::Host => {
                let remote = A2aRemoteAgentAdapter::new(
                    config.host.agent_urls.clone(),
                    Duration::from_secs(config.host.request_timeout_secs),
                    config.resilience.retry.clone(),
                );
                Arc::new(HostAgent::new(Arc::clone(&inference), Arc::new(remote)))
            },
        };

        set_expose_internal_errors(config.server.expose_internal_errors);
        info!(agent = %kind, model = %inference.current_model(), "Agent initialized");
        Ok(Self::from_parts(executor, inference, weather, config.server.clone()))
    }

    /// Assemble a server from ready-made parts, with an in-memory task store
    pub fn from_parts(
        executor: Arc<dyn AgentExecutor>,
        inference: Arc<dyn InferencePort>,
        weather: Option<Arc<dyn WeatherPort>>,
        server: ServerConfig,
    ) -> Self {
        let store: Arc<dyn TaskStorePort> = Arc::new(InMemoryTaskStore::with_limits(
            server.max_tasks,
            Duration::from_secs(server.task_ttl_secs),
        ));
        Self {
            kind: executor.kind(),
            tasks: Arc::new(TaskService::new(executor, store)),
            inference,
            weather,
            server,
        }
    }

    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Router with middleware; the card advertises `public_url`
    pub fn router(&self, public_url: &str) -> Router {
        let state = AppState {
            card: Arc::new(agent_card(self.kind, public_url)),
            tasks: Arc::clone(&self.tasks),
            inference: Arc::clone(&self.inference),
            weather: self.weather.clone(),
        };

        routes::create_router(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .option_layer(cors_layer(&self.server))
                .layer(DefaultBodyLimit::max(self.server.max_body_size_json_bytes)),
        )
    }

    /// Bind `addr` and serve until `shutdown` resolves
    pub async fn serve(
        self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on a bound listener until `shutdown` resolves
    ///
    /// Open connections get `shutdown_timeout_secs` to finish after the
    /// signal; the rest are dropped.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        let url = self.server.public_url(local.port());
        let app = self.router(&url);
        let timeout = Duration::from_secs(self.server.shutdown_timeout_secs);

        info!(
            agent = %self.kind,
            addr = %local,
            card = %format!("{url}.well-known/agent.json"),
            "Agent server listening"
        );

        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                signalled_tx.send(()).ok();
            })
            .into_future();

        let drain_deadline = async move {
            if signalled_rx.await.is_ok() {
                tokio::time::sleep(timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            result = serve => result?,
            () = drain_deadline => {
                warn!(agent = %self.kind, ?timeout, "Shutdown timeout elapsed, dropping open connections");
            },
        }

        info!(agent = %self.kind, "Agent server stopped");
        Ok(())
    }
}

fn cors_layer(config: &ServerConfig) -> Option<CorsLayer> {
    if !config.cors_enabled {
        return None;
    }
    let layer = if config.allowed_origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };
    Some(
        layer
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any),
    )
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
