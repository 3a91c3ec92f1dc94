//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that dispatches every path through the registry
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve the admin API on its own listener when enabled
//! - Apply configuration reloads to the registry while serving

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::config::ServerConfig;
use crate::handlers::{sync_handlers, HandlerRegistry};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HandlerRegistry>,
    pub config: Arc<ArcSwap<ServerConfig>>,
}

impl AppState {
    /// Build the registry from `config` and register its handlers.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(HandlerRegistry::from_config(&config.registry));
        sync_handlers(&registry, &[], &config.handlers);
        Self {
            registry,
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Switch to a new configuration, re-registering changed handlers.
    pub fn apply_config(&self, next: ServerConfig) {
        let previous = self.config.load_full();
        if previous.registry != next.registry {
            tracing::warn!("Registry settings changed; they take effect after restart");
        }
        sync_handlers(&self.registry, &previous.handlers, &next.handlers);
        self.config.store(Arc::new(next));
    }
}

/// HTTP server for the registry.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::new(config);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.load().timeouts.request_secs);
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The request router, e.g. for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until `shutdown` fires, applying every config received on
    /// `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let admin = self.state.config.load().admin.clone();
        if admin.enabled {
            let admin_listener = TcpListener::bind(&admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let admin_router = setup_admin_router(self.state.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        let reload_state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => reload_state.apply_config(config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the request path and let the active handler answer.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let path = request.uri().path();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let response = match state.registry.resolve(path) {
        Some(resolution) => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                pattern = %resolution.pattern(),
                handler_id = %resolution.registration.handler_id(),
                "Request resolved"
            );
            resolution.handler().respond(&resolution)
        }
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No handler matched");
            (StatusCode::NOT_FOUND, "No matching handler").into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}
