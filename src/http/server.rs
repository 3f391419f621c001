//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the dice and submit handlers
//! - Wire up middleware (request ID, timeout, body limit, metrics, capture)
//! - Bind the router to a listener and stop on the shutdown signal
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → PropagateRequestId → Timeout → DefaultBodyLimit
//!     → track_metrics → capture_request → handler
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers::{roll_dice, roll_dice_for_player, submit};
use crate::http::middleware::{capture::capture_request, metrics::track_metrics};
use crate::http::request::UuidRequestId;
use crate::observability::TelemetryHandle;

/// HTTP server for the dice service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServiceConfig, telemetry: TelemetryHandle) -> Self {
        Self {
            router: Self::build_router(config, telemetry),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, telemetry: TelemetryHandle) -> Router {
        Router::new()
            .route("/rolldice", get(roll_dice))
            .route("/rolldice/{player}", get(roll_dice_for_player))
            .route("/api/submit", post(submit))
            .layer(middleware::from_fn_with_state(
                telemetry.clone(),
                capture_request,
            ))
            .layer(middleware::from_fn_with_state(telemetry, track_metrics))
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
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
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
