//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request id, trace, timeout)
//! - Adapt each request into the pipeline and run it on the blocking pool
//! - Apply reloaded configs to the running pipeline
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::request::into_inbound;
use crate::http::response::error_response;
use crate::lifecycle::Shutdown;
use crate::pipeline::Pipeline;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub max_body_size: usize,
}

/// HTTP front of the gateway.
pub struct HttpServer {
    router: Router,
    pipeline: Arc<Pipeline>,
}

impl HttpServer {
    pub fn new(config: &GatewayConfig, pipeline: Pipeline) -> Self {
        let pipeline = Arc::new(pipeline);
        let state = AppState {
            pipeline: Arc::clone(&pipeline),
            max_body_size: config.security.max_body_size,
        };
        let router = Self::build_router(config, state);
        Self { router, pipeline }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// The fully layered router, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configs arriving on `updates` are applied to the gates and formatter.
    pub async fn run(
        self,
        listener: TcpListener,
        updates: Option<mpsc::UnboundedReceiver<GatewayConfig>>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(mut updates) = updates {
            let pipeline = Arc::clone(&self.pipeline);
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    pipeline.reload(&config);
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.signalled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every request goes through the pipeline.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    // Size is enforced while buffering, not by a layer: the gate answers first.
    let inbound = into_inbound(request, addr.ip(), state.max_body_size).await;

    let request_id = inbound.request_id.clone();
    tracing::debug!(
        request_id = %request_id,
        method = %inbound.method,
        path = %inbound.path,
        "Gating request"
    );

    let pipeline = Arc::clone(&state.pipeline);
    match tokio::task::spawn_blocking(move || pipeline.handle(inbound, SystemTime::now())).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Pipeline task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
