//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the WebFinger handler
//! - Wire up middleware (request ID, tracing, timeout, CORS)
//! - Serve until the shutdown signal fires

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{UuidRequestId, WebFingerParams};
use crate::http::response::outcome_label;
use crate::observability::metrics;
use crate::resolver::{Query as Lookup, ResolutionEngine};

pub const WEBFINGER_PATH: &str = "/.well-known/webfinger";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResolutionEngine>,
    pub require_resource: bool,
}

/// HTTP server for WebFinger lookups.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given settings and engine.
    pub fn new(config: ServerConfig, engine: Arc<ResolutionEngine>) -> Self {
        let state = AppState {
            engine,
            require_resource: config.http.require_resource,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let router = Router::new()
            .route(WEBFINGER_PATH, get(webfinger_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.http.request_timeout_secs,
                    )))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            );

        if config.http.cors {
            router.layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
        } else {
            router
        }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the settings.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// `GET /.well-known/webfinger`
async fn webfinger_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let start_time = Instant::now();
    let params = WebFingerParams::from_pairs(pairs);

    if state.require_resource && !params.has_resource() {
        metrics::record_request("bad_request", start_time);
        return (StatusCode::BAD_REQUEST, "Missing resource parameter").into_response();
    }

    tracing::debug!(
        resource = params.resource.as_deref().unwrap_or(""),
        rel = params.rel.as_deref().unwrap_or(""),
        "WebFinger lookup"
    );

    let lookup: Lookup = params.into();
    match state.engine.resolve(&lookup) {
        Ok(resolution) => {
            metrics::record_request(outcome_label(&resolution), start_time);
            resolution.into_response()
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Lookup did not resolve");
            metrics::record_request("not_found", start_time);
            e.into_response()
        }
    }
}
