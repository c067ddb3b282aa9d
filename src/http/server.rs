//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, access log, error reporting, timeout, panics)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::{access_log_middleware, error_report_middleware};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::panic_response;
use crate::logging::Logger;

/// Application state injected into handlers and middleware.
#[derive(Clone, Debug)]
pub struct AppState {
    pub logger: Logger,
}

/// HTTP server for the service.
pub struct HttpServer {
    config: ServiceConfig,
    state: AppState,
    routes: Router<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and logger.
    pub fn new(config: ServiceConfig, logger: Logger) -> Self {
        Self {
            config,
            state: AppState { logger },
            routes: default_routes(),
        }
    }

    /// Add routes next to the built-in ones.
    pub fn merge(mut self, routes: Router<AppState>) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: trace, request id, access log, error reporting,
    /// timeout, panic catcher.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let state = self.state;
        self.routes
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                error_report_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                access_log_middleware,
            ))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");
        self.state
            .logger
            .info(format!("Server is running on {}", addr));

        let app = self
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn default_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/test", get(ok))
        .route("/health", get(ok))
}

async fn index() -> impl IntoResponse {
    Json(json!({ "title": "Home", "message": "Hello there" }))
}

async fn ok() -> StatusCode {
    StatusCode::OK
}
