//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::checkout::{CheckoutOrchestrator, CheckoutSettings};
use crate::config::GatewayConfig;
use crate::downstream::{DownstreamResult, ServiceClients};
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: CheckoutOrchestrator,
    pub clients: ServiceClients,
}

/// HTTP server for the checkout gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> DownstreamResult<Self> {
        let clients = ServiceClients::new(&config.services, &config.timeouts)?;
        let orchestrator = CheckoutOrchestrator::new(clients.clone(), CheckoutSettings::from(&config));

        tracing::info!(
            product_url = %config.services.product_url,
            order_url = %config.services.order_url,
            payment_url = %config.services.payment_url,
            serialization = ?config.checkout.serialization,
            compensation = config.checkout.compensation,
            "Checkout orchestrator ready"
        );

        let state = AppState {
            orchestrator,
            clients,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(propagate_request_id_layer())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(middleware::map_response(handlers::envelope_timeout))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/order/checkout", post(handlers::checkout))
            .route("/order/status/{order_id}", get(handlers::order_status))
            .route("/order/callback", post(handlers::payment_callback))
            .route("/healthz", get(handlers::healthz))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
