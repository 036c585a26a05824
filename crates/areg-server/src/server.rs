use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use areg_registry::{Registry, RegistrySnapshot};

use crate::auth::HeaderCallerResolver;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_cors_layer, build_router};
use crate::state::AppState;

/// Asset registry HTTP server.
pub struct AregServer {
    config: ServerConfig,
    state: AppState,
    cors: Option<CorsLayer>,
}

impl AregServer {
    /// Build a server, loading state from the snapshot file when it exists.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let registry = match &config.snapshot_path {
            Some(path) if path.exists() => {
                let snapshot = RegistrySnapshot::read_from(path)?;
                let registry = Registry::from_snapshot(config.registry.clone(), snapshot)?;
                info!(path = %path.display(), "registry loaded from snapshot");
                registry
            }
            _ => Registry::new(config.registry.clone()),
        };
        Self::with_registry(config, Arc::new(registry))
    }

    /// Build a server around an existing registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<Registry>) -> ServerResult<Self> {
        let resolver = Arc::new(HeaderCallerResolver::new(&config.caller_header)?);
        let state = AppState::new(
            registry,
            resolver,
            &config.sequence_header,
            config.snapshot_path.clone(),
            config.counter_flush_secs > 0,
        )?;
        let cors = build_cors_layer(&config)?;
        Ok(Self { config, state, cors })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.state.registry
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let router = build_router(self.state.clone());
        match &self.cors {
            Some(cors) => router.layer(cors.clone()),
            None => router,
        }
    }

    /// Serve until Ctrl-C, then persist a final snapshot.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("areg server listening on {}", self.config.bind_addr);
        let flusher = self.spawn_counter_flush();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));
        if let Some(flusher) = flusher {
            flusher.abort();
        }
        served?;
        self.state.persist().await?;
        info!("areg server stopped");
        Ok(())
    }

    fn spawn_counter_flush(&self) -> Option<JoinHandle<()>> {
        if !self.state.defer_counters || self.state.snapshot_path.is_none() {
            return None;
        }
        let state = self.state.clone();
        let period = Duration::from_secs(self.config.counter_flush_secs);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = state.flush_counters().await {
                    warn!(error = %e, "counter flush failed");
                }
            }
        }))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
