//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the gateway and health handlers
//! - Wire up middleware (request id, tracing, timeout)
//! - Sweep expired rate-limit records in the background
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handler::{gateway_handler, AppState};
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::upstream::{UpstreamClient, UpstreamError};
use crate::security::rate_limit::RateLimiter;

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl GatewayServer {
    /// Create a server with an in-memory rate-limit store.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Create a server around an existing limiter.
    pub fn with_limiter(
        config: GatewayConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, UpstreamError> {
        let state = AppState {
            limiter: limiter.clone(),
            upstream: UpstreamClient::new(&config.upstream)?,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let gateway = Router::new()
            .route("/{*path}", get(gateway_handler))
            .with_state(state);

        let prefix = config.listener.route_prefix.as_str();
        let router = if prefix == "/" {
            gateway
        } else {
            Router::new().nest(prefix, gateway)
        };

        router.route("/health", get(health)).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request)
                        )
                    }),
                )
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                )))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
        )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route_prefix = %self.config.listener.route_prefix,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        let prune_task = match self.config.rate_limit.prune_interval_secs {
            0 => None,
            secs => Some(tokio::spawn(prune_loop(
                self.limiter.clone(),
                Duration::from_secs(secs),
                shutdown.resubscribe(),
            ))),
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        if let Some(task) = prune_task {
            let _ = task.await;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Sweep expired rate-limit records every `every` until shutdown.
async fn prune_loop(
    limiter: Arc<RateLimiter>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let removed = limiter.prune();
                if removed > 0 {
                    tracing::debug!(removed, tracked = limiter.tracked_keys(), "Pruned rate limit records");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Rate limit pruning stopped");
}
