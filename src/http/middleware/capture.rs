//! Request capture middleware.
//!
//! Every request gets a server span. The body is read once into an owned
//! buffer, its text and the raw query string are recorded on that span, and
//! the handler receives a fresh body over the same buffer, so it sees exactly
//! the bytes the client sent.
//!
//! Bodies that are not UTF-8 are captured lossily (replacement characters in
//! the attribute). The request itself is forwarded untouched.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use thiserror::Error;
use opentelemetry::trace::TraceContextExt;
use tracing::{field::Empty, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::ServiceConfig;
use crate::http::middleware::{route_of, UNMATCHED_ROUTE};
use crate::http::request::{remote_context, request_id};
use crate::observability::TelemetryHandle;

/// Span attribute holding the captured body text.
pub const REQUEST_BODY_ATTRIBUTE: &str = "http.request.body";

/// Span attribute holding the raw query string.
pub const QUERY_PARAMS_ATTRIBUTE: &str = "http.request.query_params";

/// Span attribute holding the body size in bytes before truncation.
pub const REQUEST_BODY_SIZE_ATTRIBUTE: &str = "http.request.body.size";

const REDACTED: &str = "[REDACTED]";

/// Failure to buffer a request body.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(#[source] BoxError),
}

impl CaptureError {
    fn from_body_error(err: BoxError, limit: usize) -> Self {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            CaptureError::TooLarge { limit }
        } else {
            CaptureError::Read(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CaptureError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CaptureError::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// What gets attached to spans and how much of it.
#[derive(Debug, Clone)]
pub struct CapturePolicy {
    max_body_size: usize,
    max_captured_bytes: usize,
    redact_fields: Vec<String>,
}

impl CapturePolicy {
    pub fn new(max_body_size: usize, max_captured_bytes: usize, redact_fields: Vec<String>) -> Self {
        Self {
            max_body_size,
            max_captured_bytes,
            redact_fields,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.limits.max_body_size,
            config.capture.max_captured_bytes,
            config.capture.redact_fields.clone(),
        )
    }

    /// Largest body the middleware will buffer.
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// Attribute text for a body: lossy UTF-8, redacted, then truncated on a
    /// character boundary.
    pub fn render_body(&self, bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes).into_owned();
        let text = self.redact(text);
        truncate_on_char_boundary(text, self.max_captured_bytes)
    }

    fn redact(&self, text: String) -> String {
        if self.redact_fields.is_empty() {
            return text;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(mut json) => {
                if mask_fields(&mut json, &self.redact_fields) {
                    json.to_string()
                } else {
                    text
                }
            }
            Err(_) => text,
        }
    }
}

/// Replace the values of `fields` anywhere in `value`. Returns whether
/// anything was masked.
fn mask_fields(value: &mut Value, fields: &[String]) -> bool {
    let mut masked = false;
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if fields.iter().any(|f| f == key) {
                    *inner = Value::String(REDACTED.to_string());
                    masked = true;
                } else {
                    masked |= mask_fields(inner, fields);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                masked |= mask_fields(item, fields);
            }
        }
        _ => {}
    }
    masked
}

fn truncate_on_char_boundary(mut text: String, max: usize) -> String {
    if max == 0 || text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}

/// Per-request data written into the span, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapturedRequest {
    pub body: String,
    pub query_params: String,
    pub body_size: usize,
}

impl CapturedRequest {
    /// Set the capture attributes on `span`. A disabled span ignores them.
    pub fn record_on(&self, span: &Span) {
        span.record(REQUEST_BODY_ATTRIBUTE, self.body.as_str());
        span.record(REQUEST_BODY_SIZE_ATTRIBUTE, self.body_size as u64);
        span.record(QUERY_PARAMS_ATTRIBUTE, self.query_params.as_str());
    }
}

/// A request whose body has been read into memory.
#[derive(Debug)]
pub struct BufferedRequest {
    parts: Parts,
    body: Bytes,
}

impl BufferedRequest {
    /// Read the whole body, refusing more than `limit` bytes.
    pub async fn read(request: Request<Body>, limit: usize) -> Result<Self, CaptureError> {
        let (parts, body) = request.into_parts();
        let collected = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| CaptureError::from_body_error(e, limit))?;

        Ok(Self {
            parts,
            body: collected.to_bytes(),
        })
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Raw query component, empty when the URI has none.
    pub fn query(&self) -> &str {
        self.parts.uri.query().unwrap_or("")
    }

    /// Extract the capture data. Reads the buffer without consuming it, so
    /// repeated calls give identical results.
    pub fn capture(&self, policy: &CapturePolicy) -> CapturedRequest {
        CapturedRequest {
            body: policy.render_body(&self.body),
            query_params: self.query().to_string(),
            body_size: self.body.len(),
        }
    }

    /// Rebuild the request with a fresh body over the buffer.
    pub fn into_request(self) -> Request<Body> {
        Request::from_parts(self.parts, Body::from(self.body))
    }
}

/// The server span for one request, with capture fields declared empty.
/// A valid `traceparent` from the caller makes it a child of the caller's span.
pub fn request_span<B>(request: &Request<B>) -> Span {
    let method = request.method();
    let route = route_of(request.extensions());
    let name = match route {
        Some(route) => format!("{method} {route}"),
        None => method.to_string(),
    };

    let span = tracing::info_span!(
        "HTTP request",
        otel.name = %name,
        otel.kind = "server",
        otel.status_code = Empty,
        http.request.method = %method,
        http.route = route,
        url.path = %request.uri().path(),
        request_id = %request_id(request.headers()),
        http.request.body = Empty,
        http.request.body.size = Empty,
        http.request.query_params = Empty,
        http.response.status_code = Empty,
        exception.message = Empty,
    );

    let parent = remote_context(request.headers());
    if parent.span().span_context().is_valid() {
        let _ = span.set_parent(parent);
    }
    span
}

/// Closes out the span status. Dropped without `finish` means the request
/// future was cancelled (client went away, timeout).
struct SpanOutcome {
    span: Span,
    record_exceptions: bool,
    finished: bool,
}

impl SpanOutcome {
    fn new(span: Span, record_exceptions: bool) -> Self {
        Self {
            span,
            record_exceptions,
            finished: false,
        }
    }

    /// The request failed before reaching the handler.
    fn fail(self, error: &CaptureError) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("exception.message", error.to_string().as_str());
        self.finish(error.status());
    }

    fn finish(mut self, status: StatusCode) {
        self.finished = true;
        self.span.record("http.response.status_code", status.as_u16());
        if status.is_server_error() && self.record_exceptions {
            self.span.record("otel.status_code", "ERROR");
            self.span.record(
                "exception.message",
                status.canonical_reason().unwrap_or("server error"),
            );
        }
    }
}

impl Drop for SpanOutcome {
    fn drop(&mut self) {
        if !self.finished {
            self.span.record("otel.status_code", "ERROR");
            self.span
                .record("exception.message", "request cancelled before completion");
        }
    }
}

/// Middleware: buffer, capture, tag the span, then run the rest of the stack
/// inside it.
pub async fn capture_request(
    State(telemetry): State<TelemetryHandle>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let span = request_span(&request);
    let outcome = SpanOutcome::new(span.clone(), telemetry.record_exceptions());
    let policy = telemetry.capture();

    let buffered = match BufferedRequest::read(request, policy.max_body_size())
        .instrument(span.clone())
        .await
    {
        Ok(buffered) => buffered,
        Err(e) => {
            span.in_scope(|| tracing::error!(error = %e, "Failed to read request body"));
            outcome.fail(&e);
            return e.into_response();
        }
    };

    let captured = buffered.capture(policy);
    captured.record_on(&span);

    let route = route_of(&buffered.parts().extensions).unwrap_or(UNMATCHED_ROUTE);
    telemetry
        .metrics()
        .record_body_size(&buffered.parts().method, route, captured.body_size);

    let response = next.run(buffered.into_request()).instrument(span.clone()).await;
    outcome.finish(response.status());
    response
}
