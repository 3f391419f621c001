//! HTTP server metrics middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};

use crate::http::middleware::{route_of, UNMATCHED_ROUTE};
use crate::observability::{HttpServerMetrics, TelemetryHandle};

/// Keeps the active request count honest when the request future is dropped.
struct InFlight<'a> {
    metrics: &'a HttpServerMetrics,
    method: Method,
}

impl<'a> InFlight<'a> {
    fn start(metrics: &'a HttpServerMetrics, method: Method) -> Self {
        metrics.request_started(&method);
        Self { metrics, method }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.request_finished(&self.method);
    }
}

/// Middleware recording duration and in-flight count for every request.
pub async fn track_metrics(
    State(telemetry): State<TelemetryHandle>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = route_of(request.extensions())
        .unwrap_or(UNMATCHED_ROUTE)
        .to_string();

    let metrics = telemetry.metrics();
    let _in_flight = InFlight::start(metrics, method.clone());

    let response = next.run(request).await;

    metrics.record_request(&method, &route, response.status(), start.elapsed());
    response
}
