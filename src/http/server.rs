//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the diagnostic route and catch-all proxy
//! - Wire up middleware (tracing, request ID)
//! - Spawn the background prober
//! - Dispatch requests to the tier walk in forward.rs

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Method, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigError, ProbeConfig, ProxyConfig, TimeoutConfig};
use crate::health::{HealthStore, Prober};
use crate::http::forward::forward_with_failover;
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::origin::OriginRegistry;
use crate::report;
use crate::store::{KvStore, MemoryKvStore};

/// Fixed path of the internal diagnostic endpoint.
pub const DIAGNOSTIC_PATH: &str = "/_failover/health";

/// Largest request body buffered for replay across tiers.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<OriginRegistry>,
    pub health: HealthStore,
    pub client: Client<HttpConnector, Body>,
    pub timeouts: TimeoutConfig,
    pub probe: ProbeConfig,
}

/// HTTP server for the failover proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    registry: Arc<OriginRegistry>,
    health: HealthStore,
}

impl HttpServer {
    /// Create a new HTTP server backed by an in-memory health store.
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, Arc::new(MemoryKvStore::new()))
    }

    /// Create a server against an injected KV store.
    pub fn with_store(config: ProxyConfig, kv: Arc<dyn KvStore>) -> Result<Self, ConfigError> {
        let registry =
            Arc::new(OriginRegistry::from_config(&config.origins).map_err(ConfigError::Validation)?);
        let health = HealthStore::new(kv);
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            registry: registry.clone(),
            health: health.clone(),
            client,
            timeouts: config.timeouts.clone(),
            probe: config.probe.clone(),
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            registry,
            health,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// No outer request timeout: the tier walk is bounded by its own
    /// per-attempt timeouts, and an outer layer firing mid-walk would
    /// break the attempt-every-origin guarantee.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route(DIAGNOSTIC_PATH, get(diagnostic_handler))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
        prober_shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.probe.enabled {
            let prober = Prober::new(
                self.registry.clone(),
                self.health.clone(),
                self.config.probe.clone(),
            );
            tokio::spawn(async move {
                prober.run(prober_shutdown).await;
            });
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The health store backing this server (for wiring and tests).
    pub fn health(&self) -> &HealthStore {
        &self.health
    }
}

/// Main proxy handler: buffer what must be replayable, then walk tiers.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Proxying request"
    );

    let (parts, body) = request.into_parts();

    // Bodies are buffered once so a failed attempt can be replayed
    // against the next tier. GET/HEAD never forward a body.
    let body_bytes = if parts.method == Method::GET || parts.method == Method::HEAD {
        None
    } else {
        match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Request body too large or unreadable");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        }
    };

    forward_with_failover(
        &state,
        &parts,
        body_bytes.as_ref(),
        Some(addr.ip()),
        &request_id,
    )
    .await
}

/// Diagnostic endpoint: current health snapshot plus the last failover
/// event. Reads the health store only; never triggers a probe.
async fn diagnostic_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let summary = state.health.summary();
    let last_failover = state.health.last_failover();

    let wants_html = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        Html(report::render_status_page(
            &state.registry,
            summary.as_ref(),
            last_failover.as_ref(),
        ))
        .into_response()
    } else {
        Json(report::snapshot(
            &state.registry,
            summary.as_ref(),
            last_failover,
        ))
        .into_response()
    }
}
